//! Use item use case.
//!
//! Item effects are data-driven through `ItemState`; the engine's part
//! is consuming consumables and reporting what happened.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, UserId, WorldError};

use crate::stores::PlayerViewStore;

use super::error::ActionError;
use super::parse_instance_id;

pub struct UseItem {
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct UseOutcome {
    pub item_name: String,
    pub consumed: bool,
}

impl UseItem {
    pub fn new(players: Arc<PlayerViewStore>) -> Self {
        Self { players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        raw_instance_id: &str,
    ) -> Result<UseOutcome, ActionError> {
        let instance_id = parse_instance_id(raw_instance_id)?;

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;

        let item = view
            .inventory_item(instance_id)
            .cloned()
            .ok_or_else(|| WorldError::precondition("that item is not in your inventory"))?;

        let consumed = item.state.consumable;
        if consumed {
            view.take_from_inventory(instance_id)?;
        }

        Ok(UseOutcome {
            item_name: item.semantic_name,
            consumed,
        })
    }
}
