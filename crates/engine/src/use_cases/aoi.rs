//! Area-of-interest view building.
//!
//! Produces the player-facing slice of world state: the zone they are
//! in, every spot of that zone with its visible items and NPCs, and
//! their own inventory. The payload is self-consistent with one world
//! version (`snapshot_version`); subsequent deltas baseline against it.

use std::collections::HashMap;
use std::sync::Arc;

use waypoint_domain::{ExperienceId, UserId, WorldError};
use waypoint_shared::{
    AoiAreaData, AoiItemData, AoiNpcData, AoiSpotData, AreaOfInterestData, GpsData,
    PlayerStateData, ZoneData,
};

use crate::infrastructure::ports::ClockPort;
use crate::stores::{PlayerViewStore, WorldStore};

/// GPS fix closer than this to a location's anchor counts as "there".
pub const ZONE_RADIUS_METERS: f64 = 150.0;

pub struct BuildAreaOfInterest {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
    clock: Arc<dyn ClockPort>,
}

impl BuildAreaOfInterest {
    pub fn new(
        worlds: Arc<WorldStore>,
        players: Arc<PlayerViewStore>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            worlds,
            players,
            clock,
        }
    }

    /// Build the AOI payload for a player's current position.
    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> Result<AreaOfInterestData, WorldError> {
        let view = self
            .players
            .snapshot(experience_id, user_id)
            .await
            .ok_or_else(|| WorldError::not_found("player view", user_id))?;

        let location_id = view
            .current_location
            .ok_or_else(|| WorldError::precondition("no current location; go somewhere first"))?;

        let timestamp = self.clock.now().to_rfc3339();

        self.worlds
            .with_world(experience_id, move |world| {
                let location = world
                    .location(location_id)
                    .ok_or_else(|| WorldError::not_found("location", location_id))?;

                let mut areas = HashMap::new();
                for area in location.areas.values() {
                    let mut spots = HashMap::new();
                    for spot in area.spots.values() {
                        spots.insert(
                            spot.id.to_string(),
                            AoiSpotData {
                                items: spot
                                    .items
                                    .values()
                                    .filter(|i| i.visible)
                                    .map(AoiItemData::from)
                                    .collect(),
                                npcs: spot.npcs.values().map(AoiNpcData::from).collect(),
                            },
                        );
                    }
                    areas.insert(area.id.to_string(), AoiAreaData { spots });
                }

                Ok(AreaOfInterestData {
                    timestamp,
                    snapshot_version: world.version,
                    zone: ZoneData {
                        id: location.id.to_string(),
                        name: location.name.clone(),
                        description: location.description.clone(),
                        gps: GpsData {
                            lat: location.gps.lat,
                            lng: location.gps.lng,
                        },
                    },
                    areas,
                    player: PlayerStateData {
                        current_location: Some(location.id.to_string()),
                        inventory: view.inventory.iter().map(AoiItemData::from).collect(),
                    },
                })
            })
            .await
    }
}
