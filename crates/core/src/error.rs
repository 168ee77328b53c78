use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendscoutError {
    #[error("Invalid video candidate at position {index}: {reason}")]
    InvalidCandidate { index: usize, reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Video source failed: {reason}")]
    VideoSourceFailed { reason: String },

    #[error("Trend summary failed: {reason}")]
    SummaryFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TrendscoutError>;
