//! Recoverable error taxonomy for the game core.
//!
//! None of these errors is fatal: the screen state machine returns them to the
//! front end, which presents them as messages while the session stays in its
//! last valid state.

use thiserror::Error;

use crate::session::Screen;

/// Errors produced while driving a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    /// The player's input failed validation; reprompt.
    #[error("{0}")]
    Validation(String),
    /// A mission id, mission index or hint index does not exist.
    #[error("{what} not found")]
    NotFound { what: String },
    /// The dataset provider could not supply mission data.
    #[error("mission data unavailable: {0}")]
    DataUnavailable(String),
    /// The requested action is not available from the current screen.
    #[error("'{action}' is not available on the {screen} screen")]
    InvalidTransition {
        action: &'static str,
        screen: Screen,
    },
}

impl GameError {
    #[must_use]
    pub fn mission_index(index: usize) -> Self {
        Self::NotFound {
            what: format!("mission index {index}"),
        }
    }

    #[must_use]
    pub fn mission_id(id: u32) -> Self {
        Self::NotFound {
            what: format!("mission {id}"),
        }
    }

    #[must_use]
    pub fn hint(index: usize) -> Self {
        Self::NotFound {
            what: format!("hint {}", index + 1),
        }
    }

    /// Whether the error should block the player on the current screen.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(GameError::mission_id(9).to_string(), "mission 9 not found");
        assert_eq!(GameError::hint(0).to_string(), "hint 1 not found");
        let err = GameError::InvalidTransition {
            action: "submit",
            screen: Screen::Home,
        };
        assert_eq!(err.to_string(), "'submit' is not available on the home screen");
        assert!(GameError::Validation("short".into()).is_validation());
    }
}
