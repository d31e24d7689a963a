//! Response DTOs carried inside `ServerMessage` variants.
//!
//! Wire payloads carry ids as plain strings; the typed ids stay in the
//! domain crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use waypoint_domain::{ItemInstance, NpcInstance, QuestState};

/// The single reply every command gets, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponseData {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ActionResponseData {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            item_id: None,
            metadata: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            item_id: None,
            metadata: None,
        }
    }

    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsData {
    pub lat: f64,
    pub lng: f64,
}

/// The zone block of an area-of-interest payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub gps: GpsData,
}

/// Item as it appears in AOI payloads. All five fields are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiItemData {
    pub instance_id: String,
    pub template_id: String,
    pub semantic_name: String,
    pub collectible: bool,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl From<&ItemInstance> for AoiItemData {
    fn from(item: &ItemInstance) -> Self {
        Self {
            instance_id: item.instance_id.to_string(),
            template_id: item.template_id.to_string(),
            semantic_name: item.semantic_name.clone(),
            collectible: item.collectible,
            visible: item.visible,
            symbol: item.state.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiNpcData {
    pub npc_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl From<&NpcInstance> for AoiNpcData {
    fn from(npc: &NpcInstance) -> Self {
        Self {
            npc_id: npc.npc_id.to_string(),
            name: npc.name.clone(),
            symbol: npc.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AoiSpotData {
    pub items: Vec<AoiItemData>,
    pub npcs: Vec<AoiNpcData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AoiAreaData {
    pub spots: HashMap<String, AoiSpotData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateData {
    pub current_location: Option<String>,
    pub inventory: Vec<AoiItemData>,
}

/// The player-facing filtered view of world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterestData {
    pub timestamp: String,
    /// World version this view was taken at; subsequent deltas baseline
    /// against it.
    pub snapshot_version: u64,
    pub zone: ZoneData,
    pub areas: HashMap<String, AoiAreaData>,
    pub player: PlayerStateData,
}

/// Quest progress payload for `quest_update` / `quest_complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestUpdateData {
    pub quest_id: String,
    pub status: String,
    pub bottles_collected: u32,
    pub bottles_total: u32,
}

impl From<&QuestState> for QuestUpdateData {
    fn from(state: &QuestState) -> Self {
        let status = match state.status {
            waypoint_domain::QuestStatus::NotStarted => "not_started",
            waypoint_domain::QuestStatus::InProgress => "in_progress",
            waypoint_domain::QuestStatus::Complete => "complete",
        };
        Self {
            quest_id: state.quest_id.to_string(),
            status: status.to_string(),
            bottles_collected: state.bottles_collected,
            bottles_total: state.bottles_total,
        }
    }
}

/// What a reset targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ResetScope {
    /// Restore the whole world from template and delete all player views.
    Experience,
    /// Delete one player's view; the world is untouched.
    Player { user_id: String },
    /// Restore a single item instance to its template spot.
    Instance { instance_id: String },
}

/// Result metadata of an executed reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetMetadata {
    pub reset_type: String,
    pub world_restored: bool,
    pub player_views_deleted: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_created: Option<String>,
}

/// Serializable form of a `CommandSchema` table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchemaData {
    pub action: String,
    pub description: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub response_types: Vec<String>,
}

impl From<&crate::commands::CommandSchema> for CommandSchemaData {
    fn from(schema: &crate::commands::CommandSchema) -> Self {
        Self {
            action: schema.action.to_string(),
            description: schema.description.to_string(),
            required: schema.required.iter().map(|s| s.to_string()).collect(),
            optional: schema.optional.iter().map(|s| s.to_string()).collect(),
            response_types: schema
                .response_types
                .iter()
                .map(|r| {
                    match r {
                        crate::commands::ResponseType::ActionResponse => "action_response",
                        crate::commands::ResponseType::WorldUpdate => "world_update",
                        crate::commands::ResponseType::QuestUpdate => "quest_update",
                        crate::commands::ResponseType::AreaOfInterest => "area_of_interest",
                        crate::commands::ResponseType::Pong => "pong",
                    }
                    .to_string()
                })
                .collect(),
        }
    }
}

/// Error codes carried by `error` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    ValidationError,
    NotFound,
    PreconditionFailed,
    Conflict,
    UpstreamError,
    TransientUnavailable,
    Unauthorized,
    Internal,
}
