//! Waypoint Engine library.
//!
//! This crate contains all server-side code for the Waypoint experience
//! engine.
//!
//! ## Structure
//!
//! - `stores/` - Canonical world state and per-player views
//! - `use_cases/` - Command routing, actions, quests, AOI, reset
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
