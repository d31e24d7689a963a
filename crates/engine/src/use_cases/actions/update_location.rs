//! GPS-driven navigation.
//!
//! A position fix within `ZONE_RADIUS_METERS` of a location's anchor
//! moves the player there; a fix in the middle of nowhere changes
//! nothing and says so.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, GpsCoord, LocationId, UserId};
use waypoint_shared::GpsPayload;

use crate::stores::{PlayerViewStore, WorldStore};
use crate::use_cases::aoi::ZONE_RADIUS_METERS;

use super::error::ActionError;

pub struct UpdateLocation {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct UpdateLocationOutcome {
    /// The zone entered, if the fix was close enough to one.
    pub zone: Option<(LocationId, String)>,
    pub distance_meters: Option<f64>,
}

impl UpdateLocation {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        gps: GpsPayload,
    ) -> Result<UpdateLocationOutcome, ActionError> {
        if let Some(accuracy) = gps.accuracy {
            tracing::debug!(user_id = %user_id, accuracy, "GPS fix accuracy reported");
        }
        let fix = GpsCoord::new(gps.latitude, gps.longitude);

        let nearest = self
            .worlds
            .with_world(experience_id, move |world| {
                Ok(world
                    .nearest_location(&fix)
                    .map(|(location, distance)| (location.id, location.name.clone(), distance)))
            })
            .await?;

        let Some((location_id, name, distance)) = nearest else {
            return Ok(UpdateLocationOutcome {
                zone: None,
                distance_meters: None,
            });
        };

        if distance > ZONE_RADIUS_METERS {
            return Ok(UpdateLocationOutcome {
                zone: None,
                distance_meters: Some(distance),
            });
        }

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;
        view.current_location = Some(location_id);
        view.current_area = None;

        Ok(UpdateLocationOutcome {
            zone: Some((location_id, name)),
            distance_meters: Some(distance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_domain::{Area, Location, Spot, World};

    fn seeded() -> (Arc<WorldStore>, Arc<PlayerViewStore>, ExperienceId, LocationId) {
        let location = Location::new("Pier", "The old pier", GpsCoord::new(52.5163, 13.3777))
            .with_area(Area::new().with_spot(Spot::new()));
        let location_id = location.id;
        let world = World::new("harbor").with_location(location);
        let experience_id = world.id;
        let worlds = Arc::new(WorldStore::new());
        worlds.provision(world);
        (worlds, Arc::new(PlayerViewStore::new()), experience_id, location_id)
    }

    #[tokio::test]
    async fn a_fix_inside_the_radius_enters_the_zone() {
        let (worlds, players, experience_id, location_id) = seeded();
        let user = UserId::new("alice");

        let use_case = UpdateLocation::new(worlds, players.clone());
        let outcome = use_case
            .execute(
                experience_id,
                &user,
                GpsPayload {
                    // A few meters off the anchor.
                    latitude: 52.51635,
                    longitude: 13.37775,
                    accuracy: Some(5.0),
                },
            )
            .await
            .expect("updates");

        assert_eq!(outcome.zone.as_ref().map(|z| z.0), Some(location_id));
        let view = players.snapshot(experience_id, &user).await.expect("view");
        assert_eq!(view.current_location, Some(location_id));
    }

    #[tokio::test]
    async fn a_fix_far_away_changes_nothing() {
        let (worlds, players, experience_id, _) = seeded();
        let user = UserId::new("bob");
        players.get_or_create(experience_id, &user);

        let use_case = UpdateLocation::new(worlds, players.clone());
        let outcome = use_case
            .execute(
                experience_id,
                &user,
                GpsPayload {
                    // The other side of town.
                    latitude: 52.6,
                    longitude: 13.5,
                    accuracy: None,
                },
            )
            .await
            .expect("no error");

        assert!(outcome.zone.is_none());
        assert!(outcome.distance_meters.expect("distance known") > ZONE_RADIUS_METERS);
        let view = players.snapshot(experience_id, &user).await.expect("view");
        assert_eq!(view.current_location, None);
    }
}
