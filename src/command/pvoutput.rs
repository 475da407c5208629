use std::env;

use anyhow::Result;

use crate::argsets::PvOutputArgs;
use crate::config::Config;
use crate::constants::{DEFAULT_PVOUTPUT_BASE_URL, PVOUTPUT_BASE_URL_ENV_VAR};
use crate::pvoutput::PvOutputClient;

pub fn pvoutput(args: PvOutputArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    let (api_key, system_id) = config.ensure_pvoutput_credentials(&args.config)?;
    let plant_oid = config.pvoutput.plant_oid.clone();

    let base_url = env::var(PVOUTPUT_BASE_URL_ENV_VAR)
        .unwrap_or_else(|_| DEFAULT_PVOUTPUT_BASE_URL.to_string());
    let uploader = PvOutputClient::new(&base_url, &api_key, &system_id)?;

    let mut client = super::login(&mut config, &args.config)?;
    let result = crate::pvoutput::run(&mut client, &uploader, plant_oid.as_deref(), args.date);
    super::logout(&mut client);
    result
}
