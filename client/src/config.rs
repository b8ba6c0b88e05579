use std::path::Path;
use std::path::PathBuf;

use contact_protocol::DEFAULT_BASE_URL;
use serde::Deserialize;

use crate::error::ConfigError;

/// Client settings, read from `client.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Patients collection URL; every request is built under it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "CONTACT_CLIENT_CONFIG";

    /// Overrides `base_url` from any config file.
    pub const ENV_BASE_URL: &'static str = "CONTACT_API_BASE_URL";

    pub const DEFAULT_CONFIG_FILENAME: &'static str = "client.toml";

    /// Load configuration.
    ///
    /// Resolution order:
    /// 1. `CONTACT_CLIENT_CONFIG` environment variable
    /// 2. `<config dir>/contact/client.toml`
    ///
    /// A missing file yields defaults. `CONTACT_API_BASE_URL` wins over
    /// whatever the file says.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::resolve_config_path();
        let mut cfg = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            tracing::debug!(path = %path.display(), "Client config not found, using defaults");
            Self::default()
        };

        if let Ok(base_url) = std::env::var(Self::ENV_BASE_URL)
            && !base_url.trim().is_empty()
        {
            cfg.base_url = base_url;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cfg: ClientConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|dir| dir.join("contact").join(Self::DEFAULT_CONFIG_FILENAME))
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.request_timeout_secs == 0 {
            tracing::warn!("request_timeout_secs is 0; requests will time out immediately");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = ClientConfig::parse("").expect("parse");
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.base_url, "http://localhost:3333/api/v1/patients");
        assert_eq!(cfg.request_timeout_secs, 30);
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = ClientConfig::parse(
            r#"
base_url = "https://clinic.example/api/v1/patients"
request_timeout_secs = 5
"#,
        )
        .expect("parse");
        assert_eq!(cfg.base_url, "https://clinic.example/api/v1/patients");
        assert_eq!(cfg.request_timeout_secs, 5);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ClientConfig::parse(r#"base_url = "ftp://nope""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "request_timeout_secs = 12\n").expect("write");

        let cfg = ClientConfig::load_from_path(&path).expect("load");
        assert_eq!(cfg.request_timeout_secs, 12);

        let missing = ClientConfig::load_from_path(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
