//! Executor state machine with validated transitions.
//!
//! The batch executor moves through:
//! Idle -> Checking -> Blocked | Running -> Draining -> Idle

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Lifecycle states of the batch executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Checking,
    Running,
    Draining,
    Blocked,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Checking => write!(f, "checking"),
            EngineState::Running => write!(f, "running"),
            EngineState::Draining => write!(f, "draining"),
            EngineState::Blocked => write!(f, "blocked"),
        }
    }
}

/// Validate that a state transition is allowed.
///
/// Valid transitions:
/// - Idle -> Checking
/// - Checking -> Running
/// - Checking -> Blocked (limit reached)
/// - Checking -> Draining (nothing to do)
/// - Checking -> Idle (aborted invocation)
/// - Running -> Draining
/// - Running -> Idle (aborted batch)
/// - Draining -> Idle
/// - Blocked -> Idle
pub fn validate_transition(from: EngineState, to: EngineState) -> Result<(), EngineError> {
    let valid = matches!(
        (from, to),
        (EngineState::Idle, EngineState::Checking)
            | (EngineState::Checking, EngineState::Running)
            | (EngineState::Checking, EngineState::Blocked)
            | (EngineState::Checking, EngineState::Draining)
            | (EngineState::Checking, EngineState::Idle)
            | (EngineState::Running, EngineState::Draining)
            | (EngineState::Running, EngineState::Idle)
            | (EngineState::Draining, EngineState::Idle)
            | (EngineState::Blocked, EngineState::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_to_checking() {
        assert!(validate_transition(EngineState::Idle, EngineState::Checking).is_ok());
    }

    #[test]
    fn test_checking_branches() {
        assert!(validate_transition(EngineState::Checking, EngineState::Running).is_ok());
        assert!(validate_transition(EngineState::Checking, EngineState::Blocked).is_ok());
        assert!(validate_transition(EngineState::Checking, EngineState::Draining).is_ok());
        assert!(validate_transition(EngineState::Checking, EngineState::Idle).is_ok());
    }

    #[test]
    fn test_running_to_draining() {
        assert!(validate_transition(EngineState::Running, EngineState::Draining).is_ok());
    }

    #[test]
    fn test_running_abort_to_idle() {
        assert!(validate_transition(EngineState::Running, EngineState::Idle).is_ok());
    }

    #[test]
    fn test_terminal_states_return_to_idle() {
        assert!(validate_transition(EngineState::Draining, EngineState::Idle).is_ok());
        assert!(validate_transition(EngineState::Blocked, EngineState::Idle).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(validate_transition(EngineState::Idle, EngineState::Running).is_err());
        assert!(validate_transition(EngineState::Idle, EngineState::Blocked).is_err());
        assert!(validate_transition(EngineState::Running, EngineState::Checking).is_err());
        assert!(validate_transition(EngineState::Blocked, EngineState::Running).is_err());
        assert!(validate_transition(EngineState::Draining, EngineState::Running).is_err());
    }

    #[test]
    fn test_self_transitions_are_invalid() {
        for state in [
            EngineState::Idle,
            EngineState::Checking,
            EngineState::Running,
            EngineState::Draining,
            EngineState::Blocked,
        ] {
            assert!(validate_transition(state, state).is_err());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(EngineState::Idle.to_string(), "idle");
        assert_eq!(EngineState::Blocked.to_string(), "blocked");
    }
}
