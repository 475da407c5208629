use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::helpers::prompt;

/// Credentials store backing both subcommands.
///
/// Missing fields are prompted for on first use and the file is rewritten
/// whenever something was filled in.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalSection,
    #[serde(default)]
    pub pvoutput: PvOutputSection,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PortalSection {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PvOutputSection {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub plant_oid: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config file at {}; starting empty", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("could not write config file {}", path.display()))
    }

    /// Returns portal credentials, prompting for any that are missing.
    pub fn ensure_portal_credentials(&mut self, path: &Path) -> Result<(String, String)> {
        let mut changed = false;
        if self.portal.email.is_none() {
            self.portal.email = Some(prompt("Sunny Portal email")?);
            changed = true;
        }
        if self.portal.password.is_none() {
            self.portal.password = Some(prompt("Sunny Portal password")?);
            changed = true;
        }
        if changed {
            self.save(path)?;
            log::info!("Stored portal credentials in {}", path.display());
        }
        // Both fields were just ensured above.
        Ok((
            self.portal.email.clone().unwrap_or_default(),
            self.portal.password.clone().unwrap_or_default(),
        ))
    }

    /// Returns the PVOutput API key and system id, prompting when missing.
    pub fn ensure_pvoutput_credentials(&mut self, path: &Path) -> Result<(String, String)> {
        let mut changed = false;
        if self.pvoutput.api_key.is_none() {
            self.pvoutput.api_key = Some(prompt("PVOutput API key")?);
            changed = true;
        }
        if self.pvoutput.system_id.is_none() {
            self.pvoutput.system_id = Some(prompt("PVOutput system id")?);
            changed = true;
        }
        if changed {
            self.save(path)?;
            log::info!("Stored PVOutput credentials in {}", path.display());
        }
        Ok((
            self.pvoutput.api_key.clone().unwrap_or_default(),
            self.pvoutput.system_id.clone().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spt-config.json");

        let config = Config {
            portal: PortalSection {
                email: Some("user@example.com".to_string()),
                password: Some("hunter2".to_string()),
            },
            pvoutput: PvOutputSection {
                api_key: Some("key".to_string()),
                system_id: Some("1234".to_string()),
                plant_oid: None,
            },
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spt-config.json");
        fs::write(&path, r#"{"portal": {"email": "user@example.com"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.portal.email.as_deref(), Some("user@example.com"));
        assert_eq!(config.portal.password, None);
        assert_eq!(config.pvoutput, PvOutputSection::default());
    }
}
