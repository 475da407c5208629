mod file;
mod pvoutput;

pub use file::file;
pub use pvoutput::pvoutput;

use std::env;

use anyhow::{Context, Result};
use sunnyportal::Client;

use crate::config::Config;
use crate::constants::{DEFAULT_PORTAL_BASE_URL, PORTAL_BASE_URL_ENV_VAR};

fn portal_base_url() -> String {
    env::var(PORTAL_BASE_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_PORTAL_BASE_URL.to_string())
}

/// Opens a logged-in portal session from the config, prompting for
/// credentials that are not yet stored.
fn login(config: &mut Config, config_path: &std::path::Path) -> Result<Client> {
    let (email, password) = config.ensure_portal_credentials(config_path)?;
    let mut client = Client::new(&portal_base_url())?;
    client
        .login(&email, &password)
        .context("portal login failed")?;
    Ok(client)
}

fn logout(client: &mut Client) {
    if let Err(err) = client.logout() {
        log::warn!("Portal logout failed: {err}");
    }
}
