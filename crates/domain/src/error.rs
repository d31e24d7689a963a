//! Unified error type for world operations.
//!
//! Every mutating or reading operation on the world model returns one of
//! these variants. Validation and precondition failures are recoverable
//! and map to `action_response { success: false }` at the API layer.

use thiserror::Error;

/// Unified error type for world and player-view operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Malformed or incomplete command, rejected before touching state.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown instance, location, area, NPC, or experience.
    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// Valid request, but a game-state rule forbids it.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Optimistic write lost against a concurrent mutation, after one
    /// internal retry.
    #[error("Conflict: world version moved from {expected} to {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// A reset holds the world; retry shortly.
    #[error("World temporarily unavailable: {0}")]
    TransientUnavailable(String),
}

impl WorldError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
