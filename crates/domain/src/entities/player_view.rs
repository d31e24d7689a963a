//! Per-player derived state.
//!
//! A `PlayerView` has an independent lifecycle from the world: it is
//! created lazily on first interaction and deleted by reset without
//! touching world state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{ItemInstance, QuestState};
use crate::error::WorldError;
use crate::ids::{AreaId, ExperienceId, InstanceId, LocationId, QuestId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub user_id: UserId,
    pub experience_id: ExperienceId,
    pub current_location: Option<LocationId>,
    pub current_area: Option<AreaId>,
    pub inventory: Vec<ItemInstance>,
    pub quest_progress: HashMap<QuestId, QuestState>,
}

impl PlayerView {
    pub fn new(user_id: UserId, experience_id: ExperienceId) -> Self {
        Self {
            user_id,
            experience_id,
            current_location: None,
            current_area: None,
            inventory: Vec::new(),
            quest_progress: HashMap::new(),
        }
    }

    pub fn add_to_inventory(&mut self, item: ItemInstance) {
        self.inventory.push(item);
    }

    /// Remove and return an item from the inventory.
    pub fn take_from_inventory(&mut self, instance_id: InstanceId) -> Result<ItemInstance, WorldError> {
        let idx = self
            .inventory
            .iter()
            .position(|i| i.instance_id == instance_id)
            .ok_or_else(|| WorldError::precondition("item is not in your inventory"))?;
        Ok(self.inventory.remove(idx))
    }

    pub fn inventory_item(&self, instance_id: InstanceId) -> Option<&ItemInstance> {
        self.inventory.iter().find(|i| i.instance_id == instance_id)
    }

    /// Progress entry for a quest, created on first touch.
    pub fn quest_mut(&mut self, quest_id: QuestId, bottles_total: u32) -> &mut QuestState {
        self.quest_progress
            .entry(quest_id)
            .or_insert_with(|| QuestState::new(quest_id, bottles_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TemplateId;

    #[test]
    fn take_from_inventory_removes_exactly_one() {
        let mut view = PlayerView::new(UserId::new("u1"), ExperienceId::new());
        let item = ItemInstance::new(TemplateId::new(), "brass key");
        let id = item.instance_id;
        view.add_to_inventory(item);

        let taken = view.take_from_inventory(id).expect("item present");
        assert_eq!(taken.instance_id, id);
        assert!(view.inventory.is_empty());

        let err = view.take_from_inventory(id).expect_err("already taken");
        assert!(matches!(err, WorldError::PreconditionFailed(_)));
    }
}
