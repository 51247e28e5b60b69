use std::time::Duration;

use common::mq::MessageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Publish to {channel} failed: {reason}")]
    Publish { channel: String, reason: String },

    #[error("Subscribe to {channel} failed: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("Publish to {channel} timed out after {timeout:?}")]
    Timeout { channel: String, timeout: Duration },

    #[error("Business error: {0}")]
    Message(#[from] MessageError),
}

impl From<redis::RedisError> for MqError {
    fn from(e: redis::RedisError) -> Self {
        MqError::Connection(e.to_string())
    }
}
