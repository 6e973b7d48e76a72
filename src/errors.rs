//! Bot-wide error types

use thiserror::Error;

/// Errors that can occur while building or running the grid
#[derive(Error, Debug, Clone)]
pub enum BotError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Submission failed after {attempts} attempts: {reason}")]
    Submission { attempts: u32, reason: String },

    #[error("Order {order_id} at price {price} matches no grid level")]
    Mapping { order_id: u64, price: f64 },

    #[error("Transaction {signature} not confirmed within {timeout_ms}ms")]
    AmbiguousConfirmation { signature: String, timeout_ms: u64 },

    #[error("Venue error: {0}")]
    Venue(String),

    #[error("Notification feed closed")]
    FeedClosed,
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Configuration(err.to_string())
    }
}

/// Result type for bot operations
pub type BotResult<T> = std::result::Result<T, BotError>;
