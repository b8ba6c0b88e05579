use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server error: HTTP {status} - {message}")]
    Status { status: u16, message: String },

    #[error("invalid base URL `{0}`")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// HTTP status of a non-success response, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|status| status.as_u16()),
            Self::InvalidBaseUrl(_) => None,
        }
    }
}

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

    #[error("invalid base URL `{0}`: expected http:// or https://")]
    InvalidBaseUrl(String),
}
