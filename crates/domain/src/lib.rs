//! Waypoint Domain - Core world model, value objects, and invariants.
//!
//! This crate holds the canonical data types of the experience engine:
//! the World → Location → Area → Spot containment tree, item and NPC
//! instances, per-player views, quest state, and the versioned
//! `WorldUpdate` delta format. No async, no I/O.

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use entities::{
    Area, DeliveryOutcome, ItemInstance, ItemState, Location, NpcInstance, PlayerView,
    QuestDefinition, QuestState, QuestStatus, Spot, World, WorldTemplate,
};
pub use error::WorldError;
pub use events::{ApplyError, ApplyOutcome, ChangeOperation, SpotPath, WorldChange, WorldUpdate};
pub use ids::{
    AreaId, BackupId, ConnectionId, ExperienceId, InstanceId, LocationId, NpcId, QuestId, SpotId,
    TemplateId, UserId,
};
pub use value_objects::GpsCoord;
