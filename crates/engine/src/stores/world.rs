//! Canonical world state store.
//!
//! The store is the sole owner and sole mutator of world data. Each
//! world lives behind its own async mutex, so concurrent mutations that
//! target the same world serialize; mutations never cross an await
//! point while holding the lock. Callers only ever receive copies or
//! operation results - internal containers are not exposed.
//!
//! Every committed mutation increments the world version by exactly one
//! and yields a `WorldUpdate` whose `base_version` is the pre-mutation
//! version. `snapshot_version` is stamped later, per recipient, by the
//! event broadcaster.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use waypoint_domain::{
    AreaId, ExperienceId, InstanceId, ItemInstance, LocationId, NpcId, SpotPath, World,
    WorldChange, WorldError, WorldTemplate, WorldUpdate,
};

pub struct WorldStore {
    worlds: DashMap<ExperienceId, Arc<WorldSlot>>,
}

struct WorldSlot {
    state: Mutex<World>,
    resetting: AtomicBool,
}

/// Marks a world as mid-reset for its lifetime; ordinary mutations are
/// rejected with `TransientUnavailable` while it exists.
pub struct ResetGuard {
    slot: Arc<WorldSlot>,
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        self.slot.resetting.store(false, Ordering::SeqCst);
    }
}

impl WorldStore {
    pub fn new() -> Self {
        Self {
            worlds: DashMap::new(),
        }
    }

    /// Install a world. Called at provisioning time and by reset.
    pub fn provision(&self, world: World) {
        tracing::info!(experience_id = %world.id, version = world.version, "World provisioned");
        self.worlds.insert(
            world.id,
            Arc::new(WorldSlot {
                state: Mutex::new(world),
                resetting: AtomicBool::new(false),
            }),
        );
    }

    pub fn contains(&self, experience_id: ExperienceId) -> bool {
        self.worlds.contains_key(&experience_id)
    }

    fn slot(&self, experience_id: ExperienceId) -> Result<Arc<WorldSlot>, WorldError> {
        self.worlds
            .get(&experience_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| WorldError::not_found("experience", experience_id))
    }

    fn writable_slot(&self, experience_id: ExperienceId) -> Result<Arc<WorldSlot>, WorldError> {
        let slot = self.slot(experience_id)?;
        if slot.resetting.load(Ordering::SeqCst) {
            return Err(WorldError::TransientUnavailable(
                "a reset is in progress, retry shortly".to_string(),
            ));
        }
        Ok(slot)
    }

    /// Copy-out snapshot of the whole world.
    pub async fn snapshot(&self, experience_id: ExperienceId) -> Result<World, WorldError> {
        let slot = self.slot(experience_id)?;
        let world = slot.state.lock().await;
        Ok(world.clone())
    }

    /// Read access without cloning the whole tree.
    pub async fn with_world<T>(
        &self,
        experience_id: ExperienceId,
        f: impl FnOnce(&World) -> Result<T, WorldError>,
    ) -> Result<T, WorldError> {
        let slot = self.slot(experience_id)?;
        let world = slot.state.lock().await;
        f(&world)
    }

    /// Atomically remove a collectible item for a player standing at
    /// `location_id`.
    ///
    /// The item's container path is resolved once under the lock and
    /// used for the removal, so a concurrent collect of the same
    /// instance resolves to exactly one winner.
    pub async fn collect_item(
        &self,
        experience_id: ExperienceId,
        location_id: LocationId,
        instance_id: InstanceId,
    ) -> Result<(ItemInstance, WorldUpdate), WorldError> {
        let slot = self.writable_slot(experience_id)?;
        let mut world = slot.state.lock().await;

        let (path, item) = world
            .find_item(instance_id)
            .ok_or_else(|| WorldError::not_found("item", instance_id))?;
        if !item.collectible {
            return Err(WorldError::precondition(format!(
                "the {} cannot be collected",
                item.semantic_name
            )));
        }
        if path.location_id != location_id {
            return Err(WorldError::precondition(
                "that item is not at your location",
            ));
        }

        let item = world.take_item(&path, instance_id)?;
        let update = commit(&mut world, vec![WorldChange::item_removed(path, instance_id)]);
        Ok((item, update))
    }

    /// Place an inventory item back into the world at the player's
    /// location.
    pub async fn drop_item(
        &self,
        experience_id: ExperienceId,
        location_id: LocationId,
        area_id: Option<AreaId>,
        item: ItemInstance,
    ) -> Result<WorldUpdate, WorldError> {
        let slot = self.writable_slot(experience_id)?;
        let mut world = slot.state.lock().await;

        let path = drop_target(&world, location_id, area_id)?;
        let change = WorldChange::item_added(path, item.clone());
        world.place_item(&path, item)?;
        let update = commit(&mut world, vec![change]);
        Ok(update)
    }

    /// Commit a validated delivery to an NPC.
    ///
    /// Optimistic: the caller validated against a snapshot taken at
    /// `expected_version`; if the world moved since, the commit fails
    /// with `Conflict` and the caller re-validates and retries once.
    pub async fn give_item(
        &self,
        experience_id: ExperienceId,
        expected_version: u64,
        path: SpotPath,
        npc_id: NpcId,
        item: ItemInstance,
    ) -> Result<WorldUpdate, WorldError> {
        let slot = self.writable_slot(experience_id)?;
        let mut world = slot.state.lock().await;

        if world.version != expected_version {
            return Err(WorldError::Conflict {
                expected: expected_version,
                actual: world.version,
            });
        }

        world.record_npc_delivery(&path, npc_id, item.instance_id)?;
        let update = commit(
            &mut world,
            vec![WorldChange::npc_received(path, npc_id, item)],
        );
        Ok(update)
    }

    /// Put a single instance back to the spot its template places it
    /// in, removing any copy currently elsewhere in the world.
    pub async fn restore_instance(
        &self,
        experience_id: ExperienceId,
        instance_id: InstanceId,
        template: &WorldTemplate,
    ) -> Result<WorldUpdate, WorldError> {
        let slot = self.writable_slot(experience_id)?;
        let mut world = slot.state.lock().await;

        let (template_path, template_item) = find_in_template(template, instance_id)
            .ok_or_else(|| WorldError::not_found("template instance", instance_id))?;

        let mut changes = Vec::new();
        if let Some((current_path, _)) = world.find_item(instance_id) {
            world.take_item(&current_path, instance_id)?;
            changes.push(WorldChange::item_removed(current_path, instance_id));
        }
        changes.push(WorldChange::item_added(template_path, template_item.clone()));
        world.place_item(&template_path, template_item)?;

        let update = commit(&mut world, changes);
        Ok(update)
    }

    /// Flag a world as mid-reset. While the returned guard lives,
    /// ordinary mutations fail with `TransientUnavailable`.
    pub fn begin_reset(&self, experience_id: ExperienceId) -> Result<ResetGuard, WorldError> {
        let slot = self.slot(experience_id)?;
        if slot
            .resetting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorldError::TransientUnavailable(
                "a reset is already in progress".to_string(),
            ));
        }
        Ok(ResetGuard { slot })
    }

    /// Swap in a fresh world. Only called under a `ResetGuard`.
    pub async fn replace_world(
        &self,
        experience_id: ExperienceId,
        new_world: World,
    ) -> Result<(), WorldError> {
        let slot = self.slot(experience_id)?;
        let mut world = slot.state.lock().await;
        *world = new_world;
        tracing::info!(experience_id = %experience_id, "World restored from template");
        Ok(())
    }
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Bump the version and wrap changes into the delta for this commit.
fn commit(world: &mut World, changes: Vec<WorldChange>) -> WorldUpdate {
    let base_version = world.version;
    world.version += 1;
    WorldUpdate {
        version: world.version,
        base_version,
        snapshot_version: 0,
        changes,
    }
}

/// Deterministic target spot for a drop: the player's area if known,
/// otherwise the lowest-id area, then the lowest-id spot within it.
fn drop_target(
    world: &World,
    location_id: LocationId,
    area_id: Option<AreaId>,
) -> Result<SpotPath, WorldError> {
    let location = world
        .location(location_id)
        .ok_or_else(|| WorldError::not_found("location", location_id))?;

    let area = area_id
        .and_then(|id| location.areas.get(&id))
        .or_else(|| {
            location
                .areas
                .values()
                .min_by_key(|a| a.id.to_uuid())
        })
        .ok_or_else(|| WorldError::precondition("there is nowhere to put that here"))?;

    let spot = area
        .spots
        .values()
        .min_by_key(|s| s.id.to_uuid())
        .ok_or_else(|| WorldError::precondition("there is nowhere to put that here"))?;

    Ok(SpotPath::new(location_id, area.id, spot.id))
}

fn find_in_template(
    template: &WorldTemplate,
    instance_id: InstanceId,
) -> Option<(SpotPath, ItemInstance)> {
    for location in template.locations.values() {
        for area in location.areas.values() {
            for spot in area.spots.values() {
                if let Some(item) = spot.items.get(&instance_id) {
                    return Some((SpotPath::new(location.id, area.id, spot.id), item.clone()));
                }
            }
        }
    }
    None
}
