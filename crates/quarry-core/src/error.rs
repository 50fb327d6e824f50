use thiserror::Error;

/// Top-level error type for the Quarry platform.
#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for QuarryError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
