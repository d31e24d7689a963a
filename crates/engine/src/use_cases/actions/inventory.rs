//! Inventory listing.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, UserId};
use waypoint_shared::AoiItemData;

use crate::stores::PlayerViewStore;

use super::error::ActionError;

pub struct InventoryQuery {
    players: Arc<PlayerViewStore>,
}

impl InventoryQuery {
    pub fn new(players: Arc<PlayerViewStore>) -> Self {
        Self { players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> Result<Vec<AoiItemData>, ActionError> {
        let view = self.players.get_or_create(experience_id, user_id);
        let view = view.lock().await;
        Ok(view.inventory.iter().map(AoiItemData::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_domain::{ItemInstance, TemplateId};

    #[tokio::test]
    async fn lists_held_items_with_their_wire_fields() {
        let players = Arc::new(PlayerViewStore::new());
        let experience_id = ExperienceId::new();
        let user = UserId::new("alice");
        players
            .get_or_create(experience_id, &user)
            .lock()
            .await
            .add_to_inventory(ItemInstance::new(TemplateId::new(), "brass key"));

        let use_case = InventoryQuery::new(players);
        let items = use_case.execute(experience_id, &user).await.expect("lists");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].semantic_name, "brass key");
    }
}
