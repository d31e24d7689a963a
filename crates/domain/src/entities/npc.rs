//! NPC instances.

use serde::{Deserialize, Serialize};

use crate::ids::{InstanceId, NpcId, QuestId};

/// A non-player character placed in a spot. NPCs accept items via
/// `give_item`; a `symbol` tag makes the NPC a quest delivery target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcInstance {
    pub npc_id: NpcId,
    pub name: String,
    /// Delivery target tag; `give_item` requires the item's symbol to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Quest advanced by valid deliveries to this NPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_id: Option<QuestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_state: Option<String>,
    /// Instances handed over by players, in delivery order.
    #[serde(default)]
    pub received_items: Vec<InstanceId>,
}

impl NpcInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            npc_id: NpcId::new(),
            name: name.into(),
            symbol: None,
            quest_id: None,
            dialogue_state: None,
            received_items: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_quest(mut self, quest_id: QuestId) -> Self {
        self.quest_id = Some(quest_id);
        self
    }
}
