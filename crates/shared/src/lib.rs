//! Waypoint Shared - Wire protocol between the Engine and its clients.
//!
//! This crate contains everything both sides of the WebSocket agree on:
//! - `ClientMessage` / `ServerMessage` envelope enums
//! - the closed structured-command vocabulary and its schema table
//! - response DTOs (action responses, area-of-interest payloads, quest
//!   progress)
//!
//! # Design Principles
//!
//! 1. **No business logic** - pure data types, serialization, and schema
//!    validation
//! 2. **String ids in DTOs** - wire payloads carry ids as strings; typed
//!    ids stay in the domain crate
//! 3. **Forward compatible** - new message variants are added at the end

pub mod commands;
pub mod messages;
pub mod responses;

pub use commands::{
    schema_for, validate_action, ActionName, ActionRequest, CommandSchema, CommandValidationError,
    GpsPayload, ResponseType, COMMAND_SCHEMAS,
};
pub use messages::{ClientMessage, ServerMessage};
pub use responses::{
    ActionResponseData, AoiAreaData, AoiItemData, AoiNpcData, AoiSpotData, AreaOfInterestData,
    CommandSchemaData, ErrorCode, GpsData, PlayerStateData, QuestUpdateData, ResetMetadata,
    ResetScope, ZoneData,
};
