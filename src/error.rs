//! Errors raised by the evaluation engine.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A channel value is missing, NaN, infinite or negative.
    #[error("Invalid reading for channel {channel}: {value}")]
    InvalidReading { channel: String, value: f64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The history store, threshold store or remote model failed.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl EngineError {
    pub fn invalid_reading(channel: &str, value: f64) -> Self {
        EngineError::InvalidReading {
            channel: channel.to_string(),
            value,
        }
    }

    pub fn upstream(err: impl std::fmt::Display) -> Self {
        EngineError::UpstreamUnavailable(err.to_string())
    }
}
