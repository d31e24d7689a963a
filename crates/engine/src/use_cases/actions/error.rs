//! Action errors.
//!
//! Everything here is recoverable: the router turns an `ActionError`
//! into an `action_response { success: false }` with a human-readable
//! message. Only transport failures terminate connections.

use waypoint_domain::WorldError;
use waypoint_shared::ErrorCode;

use crate::infrastructure::ports::{InterpreterError, TemplateStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("Interpretation failed: {0}")]
    Upstream(#[from] InterpreterError),
    #[error("Storage failed: {0}")]
    Storage(#[from] TemplateStoreError),
}

impl ActionError {
    /// Message shown to the player in the action response.
    pub fn user_message(&self) -> String {
        match self {
            Self::World(e) => e.to_string(),
            Self::Upstream(_) => "The guide is not responding right now; try again".to_string(),
            Self::Storage(_) => "The experience is temporarily unavailable; try again".to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::World(WorldError::Validation(_)) => ErrorCode::ValidationError,
            Self::World(WorldError::NotFound { .. }) => ErrorCode::NotFound,
            Self::World(WorldError::PreconditionFailed(_)) => ErrorCode::PreconditionFailed,
            Self::World(WorldError::Conflict { .. }) => ErrorCode::Conflict,
            Self::World(WorldError::TransientUnavailable(_)) => ErrorCode::TransientUnavailable,
            Self::Upstream(_) => ErrorCode::UpstreamError,
            Self::Storage(_) => ErrorCode::TransientUnavailable,
        }
    }
}
