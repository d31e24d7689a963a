//! Drop item use case - the inverse of collect.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, UserId, WorldError, WorldUpdate};

use crate::stores::{PlayerViewStore, WorldStore};

use super::error::ActionError;
use super::parse_instance_id;

pub struct DropItem {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct DropOutcome {
    pub item_name: String,
    pub update: WorldUpdate,
}

impl DropItem {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        raw_instance_id: &str,
    ) -> Result<DropOutcome, ActionError> {
        let instance_id = parse_instance_id(raw_instance_id)?;

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;

        let location_id = view
            .current_location
            .ok_or_else(|| WorldError::precondition("you are not at any location"))?;
        let area_id = view.current_area;

        let item = view.take_from_inventory(instance_id)?;
        let item_name = item.semantic_name.clone();

        match self
            .worlds
            .drop_item(experience_id, location_id, area_id, item.clone())
            .await
        {
            Ok(update) => Ok(DropOutcome { item_name, update }),
            Err(e) => {
                // The world refused; the item goes back so it is never
                // in zero containers.
                view.add_to_inventory(item);
                Err(e.into())
            }
        }
    }
}
