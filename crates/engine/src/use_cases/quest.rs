//! Quest rules that a raw mutation cannot express alone.
//!
//! Two checks gate every delivery, both evaluated before anything is
//! committed: the symbol rule (the item's tag must match the target's
//! tag) and completion idempotence (a finished quest accepts nothing
//! more). Progress counting itself lives on `QuestState`.

use waypoint_domain::{
    ItemInstance, NpcInstance, PlayerView, QuestDefinition, QuestStatus, WorldError,
};

pub struct QuestEngine;

impl QuestEngine {
    /// Symbol rule: an NPC tagged with a symbol only accepts items
    /// bearing the same symbol. Untagged NPCs accept anything.
    pub fn validate_symbol(item: &ItemInstance, npc: &NpcInstance) -> Result<(), WorldError> {
        let Some(required) = npc.symbol.as_deref() else {
            return Ok(());
        };

        match item.state.symbol.as_deref() {
            Some(symbol) if symbol == required => Ok(()),
            Some(symbol) => Err(WorldError::precondition(format!(
                "{} refuses the {}: its {symbol} mark does not match the {required} sign",
                npc.name, item.semantic_name
            ))),
            None => Err(WorldError::precondition(format!(
                "{} refuses the {}: it bears no mark at all",
                npc.name, item.semantic_name
            ))),
        }
    }

    /// Completion idempotence: re-delivering against a finished quest is
    /// rejected before any state is touched.
    pub fn ensure_not_complete(
        view: &PlayerView,
        quest: &QuestDefinition,
    ) -> Result<(), WorldError> {
        match view.quest_progress.get(&quest.id) {
            Some(state) if state.status == QuestStatus::Complete => Err(
                WorldError::precondition(format!("the quest '{}' is already complete", quest.name)),
            ),
            _ => Ok(()),
        }
    }
}
