use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::errors::{KeysmithError, Result};

/// Top-level keysmith configuration read from `config.toml`.
///
/// Every section is optional; a missing file means defaults everywhere.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user file in the
    /// platform config directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(KeysmithError::InvalidConfig {
                    detail: format!("config file not found: {}", p.display()),
                });
            }
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content).map_err(|e| match e {
            KeysmithError::InvalidConfig { detail } => KeysmithError::InvalidConfig {
                detail: format!("{}: {detail}", path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| KeysmithError::InvalidConfig {
            detail: format!("Failed to parse config: {e}"),
        })?;

        if let Some(url) = &config.engine.keyserver {
            let known = ["hkp://", "hkps://", "http://", "https://", "ldap://", "ldaps://"];
            if !known.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(KeysmithError::InvalidConfig {
                    detail: format!(
                        "keyserver '{url}' must start with one of: {}",
                        known.join(", ")
                    ),
                });
            }
        }
        Ok(config)
    }

    /// `<config dir>/keysmith/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keysmith").join("config.toml"))
    }
}

/// The `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// OpenPGP engine binary.
    pub gpg_path: PathBuf,
    /// S/MIME engine binary.
    pub gpgsm_path: PathBuf,
    /// Passed to the engine as `GNUPGHOME`.
    pub homedir: Option<PathBuf>,
    /// Key server for searches; the engine's own default when unset.
    pub keyserver: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            gpg_path: PathBuf::from("gpg"),
            gpgsm_path: PathBuf::from("gpgsm"),
            homedir: None,
            keyserver: None,
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive, e.g. `keysmith=info`.
    pub level: Option<String>,
}
