use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {var} `{value}`")]
    InvalidEnv { var: &'static str, value: String },
}

/// Server settings, read from `server.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// SQLite file holding the patient table.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Insert demo patients into an empty store on startup.
    #[serde(default)]
    pub seed_demo: bool,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3333))
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("contact").join("patients.db"))
        .unwrap_or_else(|| PathBuf::from("patients.db"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            seed_demo: false,
        }
    }
}

impl ServerConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "CONTACT_SERVER_CONFIG";
    pub const ENV_BIND_ADDR: &'static str = "CONTACT_BIND_ADDR";
    pub const ENV_DB_PATH: &'static str = "CONTACT_DB_PATH";

    pub const DEFAULT_CONFIG_FILENAME: &'static str = "server.toml";

    /// Load configuration.
    ///
    /// Resolution order:
    /// 1. `CONTACT_SERVER_CONFIG` environment variable
    /// 2. `<config dir>/contact/server.toml`
    ///
    /// A missing file yields defaults; `CONTACT_BIND_ADDR` and
    /// `CONTACT_DB_PATH` are applied on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::resolve_config_path();
        let mut cfg = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            tracing::info!(path = %path.display(), "Server config not found, using defaults");
            Self::default()
        };
        cfg.apply_env()?;
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
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(Self::ENV_BIND_ADDR) {
            self.bind_addr = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: Self::ENV_BIND_ADDR,
                value,
            })?;
        }
        if let Ok(value) = std::env::var(Self::ENV_DB_PATH)
            && !value.is_empty()
        {
            self.db_path = PathBuf::from(value);
        }
        Ok(())
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|dir| dir.join("contact").join(Self::DEFAULT_CONFIG_FILENAME))
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = ServerConfig::parse("").expect("parse");
        assert_eq!(cfg.bind_addr, "127.0.0.1:3333".parse().unwrap());
        assert!(!cfg.seed_demo);
        assert!(cfg.db_path.ends_with("patients.db"));
    }

    #[test]
    fn reads_every_field() {
        let cfg = ServerConfig::parse(
            r#"
bind_addr = "0.0.0.0:8080"
db_path = "/var/lib/contact/patients.db"
seed_demo = true
"#,
        )
        .expect("parse");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/contact/patients.db"));
        assert!(cfg.seed_demo);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        assert!(matches!(
            ServerConfig::parse(r#"bind_addr = "not an address""#),
            Err(ConfigError::Parse(_))
        ));
    }
}
