//! Item instances - collectible and interactable objects.
//!
//! An `ItemInstance` is spawned from a template and lives in exactly one
//! container at a time: a `Spot` in the world, or a player's inventory.
//! That exclusivity is the core invariant of the world model; every move
//! is a remove-from-one-container / add-to-the-other pair resolved
//! through a single canonical path (see `events::SpotPath`).

use serde::{Deserialize, Serialize};

use crate::ids::{InstanceId, TemplateId};

/// A concrete item placed in the world or carried by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub instance_id: InstanceId,
    /// The template this instance was spawned from.
    pub template_id: TemplateId,
    /// Stable name used by the interpretation collaborator ("brass key",
    /// "spiral bottle").
    pub semantic_name: String,
    /// Whether `collect_item` may move it into an inventory.
    pub collectible: bool,
    /// Hidden items are omitted from area-of-interest payloads but stay
    /// addressable by exact instance id.
    pub visible: bool,
    pub state: ItemState,
}

impl ItemInstance {
    pub fn new(template_id: TemplateId, semantic_name: impl Into<String>) -> Self {
        Self {
            instance_id: InstanceId::new(),
            template_id,
            semantic_name: semantic_name.into(),
            collectible: true,
            visible: true,
            state: ItemState::default(),
        }
    }

    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = state;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.collectible = false;
        self
    }
}

/// Free-form item state.
///
/// `symbol` participates in quest validation (delivery requires the item
/// and target symbols to match). Anything else rides in `properties` as a
/// JSON string - item effects are data, not code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Consumables are removed from the inventory on `use_item`.
    #[serde(default)]
    pub consumable: bool,
    /// Item-specific properties (JSON string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

impl ItemState {
    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }
}
