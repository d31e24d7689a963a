//! Use cases - one module per user-visible capability.

pub mod actions;
pub mod aoi;
pub mod interpret;
pub mod quest;
pub mod reset;
pub mod router;

pub use router::{CommandRouter, DispatchOutcome};
