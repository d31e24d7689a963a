//! Examine use case - strictly read-only.
//!
//! No version bump, no broadcast. Works for items in the player's
//! inventory and for visible items at their location.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, ItemInstance, UserId, WorldError};

use crate::stores::{PlayerViewStore, WorldStore};

use super::error::ActionError;
use super::parse_instance_id;

pub struct Examine {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

impl Examine {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        raw_instance_id: &str,
    ) -> Result<String, ActionError> {
        let instance_id = parse_instance_id(raw_instance_id)?;

        let view = self.players.get_or_create(experience_id, user_id);
        let view = view.lock().await;

        if let Some(item) = view.inventory_item(instance_id) {
            return Ok(describe(item, true));
        }

        let location_id = view
            .current_location
            .ok_or_else(|| WorldError::not_found("item", instance_id))?;

        let description = self
            .worlds
            .with_world(experience_id, move |world| {
                let (path, item) = world
                    .find_item(instance_id)
                    .filter(|(_, item)| item.visible)
                    .ok_or_else(|| WorldError::not_found("item", instance_id))?;
                if path.location_id != location_id {
                    return Err(WorldError::precondition("that item is not at your location"));
                }
                Ok(describe(item, false))
            })
            .await?;

        Ok(description)
    }
}

fn describe(item: &ItemInstance, held: bool) -> String {
    let mut description = if held {
        format!("You turn the {} over in your hands.", item.semantic_name)
    } else {
        format!("You take a closer look at the {}.", item.semantic_name)
    };
    if let Some(symbol) = &item.state.symbol {
        description.push_str(&format!(" A {symbol} mark is etched into it."));
    }
    if !item.collectible && !held {
        description.push_str(" It is fixed in place.");
    }
    description
}
