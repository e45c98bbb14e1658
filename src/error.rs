use thiserror::Error;

#[derive(Error, Debug)]
pub enum QvaultError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid share link '{0}': {1}")]
    InvalidLink(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication required: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("{0}")]
    Other(String),
}

impl QvaultError {
    /// Whether re-issuing the same request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            QvaultError::Timeout { .. } => true,
            QvaultError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            QvaultError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, QvaultError>;
