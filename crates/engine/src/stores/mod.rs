//! In-memory canonical state.
//!
//! - `WorldStore` - versioned world data, single writer per world
//! - `PlayerViewStore` - per-user derived state, independent lifecycle

pub mod player;
pub mod world;

pub use player::PlayerViewStore;
pub use world::{ResetGuard, WorldStore};
