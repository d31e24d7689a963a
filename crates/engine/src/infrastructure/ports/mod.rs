//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Authentication (the engine trusts the auth collaborator's verdict)
//! - Natural-language interpretation (could swap the backing service)
//! - The pub/sub broker (in-process today, external tomorrow)
//! - Template/backup persistence (could swap SQLite -> Postgres)
//! - Clock (for testing)

mod error;
mod external;
mod testing;

pub use error::{AuthError, BrokerError, InterpreterError, TemplateStoreError};
pub use external::{
    AuthPort, BrokerPort, Interpretation, InterpreterContext, InterpreterPort, SubscriptionId,
    TemplateStorePort,
};
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockAuthPort, MockBrokerPort, MockInterpreterPort, MockTemplateStorePort};

#[cfg(test)]
pub use testing::MockClockPort;
