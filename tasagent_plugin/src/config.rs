use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read bot config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bot config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of the bot's own config file this plugin cares about.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BotConfiguration {
    #[serde(alias = "authConfiguration")]
    pub auth_configuration: AuthConfiguration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthConfiguration {
    #[serde(alias = "admin")]
    pub admin: CredentialSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CredentialSet {
    #[serde(alias = "authString")]
    pub auth_string: Zeroizing<String>,
}

impl BotConfiguration {
    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Admin credential, or `None` when the file leaves it blank.
    pub fn admin_auth(&self) -> Option<&str> {
        let s = self.auth_configuration.admin.auth_string.as_str();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

/// Reads the file fresh on every call; nothing is cached.
pub async fn load_bot_configuration(path: &Path) -> Result<BotConfiguration, ConfigError> {
    let raw = Zeroizing::new(tokio::fs::read_to_string(path).await.map_err(|source| {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?);
    BotConfiguration::parse(path, &raw)
}
