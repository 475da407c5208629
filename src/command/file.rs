use anyhow::Result;

use crate::argsets::FileArgs;
use crate::config::Config;
use crate::export;

pub fn file(args: FileArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    let mut client = super::login(&mut config, &args.config)?;

    let result = export::run(&mut client, &args);
    super::logout(&mut client);
    result
}
