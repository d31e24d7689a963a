//! Domain entities.

mod item;
mod location;
mod npc;
mod player_view;
mod quest;
mod world;

pub use item::{ItemInstance, ItemState};
pub use location::{Area, Location, Spot};
pub use npc::NpcInstance;
pub use player_view::PlayerView;
pub use quest::{DeliveryOutcome, QuestDefinition, QuestState, QuestStatus};
pub use world::{World, WorldTemplate};
