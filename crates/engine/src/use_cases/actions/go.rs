//! Explicit navigation to a named location.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, LocationId, UserId, WorldError};

use crate::stores::{PlayerViewStore, WorldStore};

use super::error::ActionError;

pub struct Go {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct GoOutcome {
    pub location_id: LocationId,
    pub location_name: String,
}

impl Go {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    /// Destination is a location id or a case-insensitive location name.
    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        destination: &str,
    ) -> Result<GoOutcome, ActionError> {
        let destination = destination.trim().to_string();
        let resolved = self
            .worlds
            .with_world(experience_id, move |world| {
                let location = match destination.parse::<LocationId>() {
                    Ok(id) => world.location(id),
                    Err(_) => world.location_by_name(&destination),
                };
                let location = location
                    .ok_or_else(|| WorldError::not_found("location", destination.clone()))?;
                Ok((location.id, location.name.clone()))
            })
            .await?;

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;
        view.current_location = Some(resolved.0);
        view.current_area = None;

        Ok(GoOutcome {
            location_id: resolved.0,
            location_name: resolved.1,
        })
    }
}
