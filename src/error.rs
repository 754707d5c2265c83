use thiserror::Error;

/// Errors produced by the rate limiting engine and its Redis backend.
///
/// Decision calls never surface these to callers of `allow()`: every variant
/// observed on the decision path denies and logs. Only startup treats
/// `Config` and `Connection` as fatal.
#[derive(Debug, Error)]
pub enum RatewallError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("script not cached by redis: {0}")]
    ScriptMissing(String),

    #[error("unexpected script reply: {0}")]
    ResultShape(String),
}

pub type Result<T> = std::result::Result<T, RatewallError>;

impl From<redis::RedisError> for RatewallError {
    fn from(err: redis::RedisError) -> Self {
        if err.kind() == redis::ErrorKind::NoScriptError {
            RatewallError::ScriptMissing(err.to_string())
        } else {
            RatewallError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noscript_maps_to_script_missing() {
        let err = redis::RedisError::from((
            redis::ErrorKind::NoScriptError,
            "NOSCRIPT",
            "No matching script".to_string(),
        ));
        assert!(matches!(
            RatewallError::from(err),
            RatewallError::ScriptMissing(_)
        ));
    }

    #[test]
    fn test_io_error_maps_to_connection() {
        let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        assert!(matches!(
            RatewallError::from(err),
            RatewallError::Connection(_)
        ));
    }
}
