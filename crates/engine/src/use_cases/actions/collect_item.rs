//! Collect item use case.
//!
//! Moves an item from a spot at the player's location into the
//! player's inventory. The world-side removal and the inventory-side
//! insert happen under the player's view lock, with the world store
//! deciding the single winner when two players race for one instance.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, ItemInstance, UserId, WorldError, WorldUpdate};

use crate::stores::{PlayerViewStore, WorldStore};

use super::error::ActionError;
use super::parse_instance_id;

pub struct CollectItem {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct CollectOutcome {
    pub item: ItemInstance,
    pub update: WorldUpdate,
}

impl CollectItem {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        raw_instance_id: &str,
    ) -> Result<CollectOutcome, ActionError> {
        let instance_id = parse_instance_id(raw_instance_id)?;

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;

        let location_id = view.current_location.ok_or_else(|| {
            WorldError::precondition("you are not at any location yet; go somewhere first")
        })?;

        let (item, update) = self
            .worlds
            .collect_item(experience_id, location_id, instance_id)
            .await?;

        view.add_to_inventory(item.clone());

        Ok(CollectOutcome { item, update })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_domain::{Area, GpsCoord, Location, LocationId, Spot, TemplateId, World};

    fn seeded() -> (Arc<WorldStore>, Arc<PlayerViewStore>, ExperienceId, LocationId, waypoint_domain::InstanceId) {
        let item = ItemInstance::new(TemplateId::new(), "brass key");
        let instance_id = item.instance_id;
        let fixed = ItemInstance::new(TemplateId::new(), "anvil").fixed();
        let location = Location::new("Forge", "A smoky forge", GpsCoord::new(50.0, 8.0))
            .with_area(Area::new().with_spot(Spot::new().with_item(item).with_item(fixed)));
        let location_id = location.id;
        let world = World::new("village").with_location(location);
        let experience_id = world.id;

        let worlds = Arc::new(WorldStore::new());
        worlds.provision(world);
        (worlds, Arc::new(PlayerViewStore::new()), experience_id, location_id, instance_id)
    }

    #[tokio::test]
    async fn when_player_is_at_the_item_location_collect_succeeds() {
        let (worlds, players, experience_id, location_id, instance_id) = seeded();
        let user = UserId::new("alice");
        players
            .get_or_create(experience_id, &user)
            .lock()
            .await
            .current_location = Some(location_id);

        let use_case = CollectItem::new(worlds, players.clone());
        let outcome = use_case
            .execute(experience_id, &user, &instance_id.to_string())
            .await
            .expect("collects");

        assert_eq!(outcome.item.instance_id, instance_id);
        assert_eq!(outcome.update.version, 1);

        let view = players.snapshot(experience_id, &user).await.expect("view");
        assert!(view.inventory_item(instance_id).is_some());
    }

    #[tokio::test]
    async fn when_player_is_elsewhere_collect_fails_without_mutation() {
        let (worlds, players, experience_id, _, instance_id) = seeded();
        let user = UserId::new("bob");
        // Player stands at an unrelated location.
        players
            .get_or_create(experience_id, &user)
            .lock()
            .await
            .current_location = Some(LocationId::new());

        let use_case = CollectItem::new(worlds.clone(), players);
        let err = use_case
            .execute(experience_id, &user, &instance_id.to_string())
            .await
            .expect_err("wrong location");
        assert!(matches!(
            err,
            ActionError::World(WorldError::PreconditionFailed(_))
        ));

        let snapshot = worlds.snapshot(experience_id).await.expect("snapshot");
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.find_item(instance_id).is_some());
    }

    #[tokio::test]
    async fn when_instance_id_is_malformed_validation_fails_fast() {
        let (worlds, players, experience_id, _, _) = seeded();
        let user = UserId::new("carol");

        let use_case = CollectItem::new(worlds, players);
        let err = use_case
            .execute(experience_id, &user, "not-a-uuid")
            .await
            .expect_err("malformed id");
        assert!(matches!(err, ActionError::World(WorldError::Validation(_))));
    }
}
