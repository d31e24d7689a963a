//! Error types for infrastructure ports.

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token rejected")]
    InvalidToken,
    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    #[error("Interpretation request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid interpretation response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateStoreError {
    #[error("Template not found")]
    NotFound,
    #[error("Database error during {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TemplateStoreError {
    pub fn database(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Database {
            operation,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}
