//! Error types for the bridge library

use thiserror::Error;

/// Bridge error types
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Could not reach the kiosk shell
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error while talking to the shell
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for the shell
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The shell sent something we could not parse
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A bridge function existed but the shell reported failure
    #[error("Bridge call {name} failed: {message}")]
    Call { name: String, message: String },

    /// The shell does not advertise this function
    ///
    /// Not a hard failure for callers that probed capabilities first;
    /// it is the routing signal to use a fallback or skip.
    #[error("Bridge function not available: {0}")]
    Unsupported(&'static str),

    /// The connection to the shell is gone
    #[error("Bridge connection closed")]
    Closed,
}

impl BridgeError {
    /// True when the error only means the function is not advertised,
    /// as opposed to an attempted call going wrong.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, BridgeError::Unsupported(_))
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_display() {
        let err = BridgeError::Call {
            name: "printImage".to_string(),
            message: "printer jam".to_string(),
        };
        assert_eq!(err.to_string(), "Bridge call printImage failed: printer jam");
    }

    #[test]
    fn test_capability_missing_classification() {
        assert!(BridgeError::Unsupported("printImage").is_capability_missing());
        assert!(!BridgeError::Closed.is_capability_missing());
    }
}
