//! The canonical world: a versioned tree of locations.
//!
//! All reads hand out references scoped to `&self`; all mutations go
//! through named operations that resolve a `SpotPath` once and use it
//! for both lookup and removal. Version bumps happen only in the store
//! layer, which owns write serialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{ItemInstance, Location, NpcInstance, QuestDefinition, Spot};
use crate::error::WorldError;
use crate::events::{ApplyError, ApplyOutcome, ChangeOperation, SpotPath, WorldUpdate};
use crate::ids::{ExperienceId, InstanceId, LocationId, NpcId, QuestId};
use crate::value_objects::GpsCoord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub id: ExperienceId,
    pub name: String,
    /// Monotonic mutation counter; every committed mutation increments
    /// it by exactly one.
    pub version: u64,
    pub locations: HashMap<LocationId, Location>,
    pub quests: HashMap<QuestId, QuestDefinition>,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ExperienceId::new(),
            name: name.into(),
            version: 0,
            locations: HashMap::new(),
            quests: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.id, location);
        self
    }

    pub fn with_quest(mut self, quest: QuestDefinition) -> Self {
        self.quests.insert(quest.id, quest);
        self
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn location_by_name(&self, name: &str) -> Option<&Location> {
        self.locations
            .values()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Closest location to `gps` and its distance in meters.
    pub fn nearest_location(&self, gps: &GpsCoord) -> Option<(&Location, f64)> {
        self.locations
            .values()
            .map(|l| (l, l.gps.distance_meters(gps)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn quest(&self, id: QuestId) -> Option<&QuestDefinition> {
        self.quests.get(&id)
    }

    /// Locate an item instance anywhere in the world tree.
    pub fn find_item(&self, instance_id: InstanceId) -> Option<(SpotPath, &ItemInstance)> {
        for location in self.locations.values() {
            for area in location.areas.values() {
                for spot in area.spots.values() {
                    if let Some(item) = spot.items.get(&instance_id) {
                        return Some((SpotPath::new(location.id, area.id, spot.id), item));
                    }
                }
            }
        }
        None
    }

    pub fn find_npc(&self, npc_id: NpcId) -> Option<(SpotPath, &NpcInstance)> {
        for location in self.locations.values() {
            for area in location.areas.values() {
                for spot in area.spots.values() {
                    if let Some(npc) = spot.npcs.get(&npc_id) {
                        return Some((SpotPath::new(location.id, area.id, spot.id), npc));
                    }
                }
            }
        }
        None
    }

    fn spot_mut(&mut self, path: &SpotPath) -> Result<&mut Spot, WorldError> {
        self.locations
            .get_mut(&path.location_id)
            .and_then(|l| l.areas.get_mut(&path.area_id))
            .and_then(|a| a.spots.get_mut(&path.spot_id))
            .ok_or_else(|| WorldError::not_found("spot", path.render()))
    }

    /// Remove an item through the same path it was found at.
    pub fn take_item(
        &mut self,
        path: &SpotPath,
        instance_id: InstanceId,
    ) -> Result<ItemInstance, WorldError> {
        self.spot_mut(path)?
            .items
            .remove(&instance_id)
            .ok_or_else(|| WorldError::not_found("item", instance_id))
    }

    pub fn place_item(&mut self, path: &SpotPath, item: ItemInstance) -> Result<(), WorldError> {
        self.spot_mut(path)?.items.insert(item.instance_id, item);
        Ok(())
    }

    /// Record that an NPC accepted an item instance.
    pub fn record_npc_delivery(
        &mut self,
        path: &SpotPath,
        npc_id: NpcId,
        instance_id: InstanceId,
    ) -> Result<(), WorldError> {
        let spot = self.spot_mut(path)?;
        let npc = spot
            .npcs
            .get_mut(&npc_id)
            .ok_or_else(|| WorldError::not_found("npc", npc_id))?;
        npc.received_items.push(instance_id);
        Ok(())
    }

    /// Apply a delta to this world as a client-side projection.
    ///
    /// Idempotent by version: an already-applied update is skipped, a
    /// gap is an error (request a fresh snapshot).
    pub fn apply_update(&mut self, update: &WorldUpdate) -> Result<ApplyOutcome, ApplyError> {
        if update.version <= self.version {
            return Ok(ApplyOutcome::AlreadyApplied);
        }
        if update.base_version != self.version {
            return Err(ApplyError::VersionGap {
                have: self.version,
                update_base: update.base_version,
            });
        }

        for change in &update.changes {
            let spot = self
                .locations
                .get_mut(&change.spot.location_id)
                .and_then(|l| l.areas.get_mut(&change.spot.area_id))
                .and_then(|a| a.spots.get_mut(&change.spot.spot_id))
                .ok_or_else(|| ApplyError::UnknownContainer(change.path.clone()))?;

            match change.operation {
                ChangeOperation::Add => {
                    if let Some(item) = &change.item {
                        spot.items.insert(item.instance_id, item.clone());
                    }
                }
                ChangeOperation::Remove => {
                    spot.items.remove(&change.instance_id);
                }
                ChangeOperation::Update => {
                    if let Some(npc_id) = change.npc_id {
                        let npc = spot
                            .npcs
                            .get_mut(&npc_id)
                            .ok_or_else(|| ApplyError::UnknownContainer(change.path.clone()))?;
                        if !npc.received_items.contains(&change.instance_id) {
                            npc.received_items.push(change.instance_id);
                        }
                    }
                }
            }
        }

        self.version = update.version;
        Ok(ApplyOutcome::Applied)
    }
}

/// Serializable authoritative template: a world at version zero.
///
/// The reset manager restores from this; provisioning instantiates it.
/// Instance ids are preserved so a reset world is addressable by the
/// same ids as the original provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldTemplate {
    pub experience_id: ExperienceId,
    pub name: String,
    pub locations: HashMap<LocationId, Location>,
    pub quests: HashMap<QuestId, QuestDefinition>,
}

impl WorldTemplate {
    pub fn from_world(world: &World) -> Self {
        Self {
            experience_id: world.id,
            name: world.name.clone(),
            locations: world.locations.clone(),
            quests: world.quests.clone(),
        }
    }

    pub fn instantiate(&self) -> World {
        World {
            id: self.experience_id,
            name: self.name.clone(),
            version: 0,
            locations: self.locations.clone(),
            quests: self.quests.clone(),
        }
    }
}
