//! Error types for the kudos engine.

use ovation_core::error::OvationError;

use crate::state::EngineState;

/// Errors from the feed discovery collaborator.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The feed could not be read at all (page gone, transport down).
    #[error("Feed unavailable: {0}")]
    Unavailable(String),
    /// The host rejected one kudo (control gone, already acted upon).
    #[error("Kudo rejected: {0}")]
    Rejected(String),
}

impl From<FeedError> for OvationError {
    fn from(err: FeedError) -> Self {
        OvationError::Feed(err.to_string())
    }
}

/// Errors from the batch executor.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(EngineState, EngineState),
    #[error("Storage error: {0}")]
    Storage(#[from] OvationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_display() {
        let err = FeedError::Unavailable("connection reset".to_string());
        assert_eq!(err.to_string(), "Feed unavailable: connection reset");

        let err = FeedError::Rejected("already acted upon".to_string());
        assert_eq!(err.to_string(), "Kudo rejected: already acted upon");
    }

    #[test]
    fn test_feed_error_into_ovation_error() {
        let err: OvationError = FeedError::Unavailable("gone".to_string()).into();
        assert!(matches!(err, OvationError::Feed(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidTransition(EngineState::Idle, EngineState::Running);
        assert_eq!(err.to_string(), "Invalid state transition: idle -> running");
    }

    #[test]
    fn test_engine_error_from_ovation_error() {
        let err: EngineError = OvationError::Storage("disk full".to_string()).into();
        assert!(matches!(err, EngineError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
