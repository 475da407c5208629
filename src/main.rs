use anyhow::{anyhow, Result};
use dotenv::dotenv;
use env_logger::Env;

use spt::argsets::{FileArgs, PvOutputArgs};
use spt::command;
use spt::constants::{DEFAULT_LOG_LEVEL, LOG_LEVEL_ENV_VAR};

const CMD_FILE: &str = "file";
const CMD_PVOUTPUT: &str = "pvoutput";

fn main() -> Result<()> {
    let _ = dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(LOG_LEVEL_ENV_VAR, DEFAULT_LOG_LEVEL))
        .init();

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_FILE) => command::file(FileArgs::parse(args)?),
        Some(CMD_PVOUTPUT) => command::pvoutput(PvOutputArgs::parse(args)?),
        _ => Err(anyhow!(
            "Subcommand must be one of '{CMD_FILE}', '{CMD_PVOUTPUT}'"
        )),
    }
}
