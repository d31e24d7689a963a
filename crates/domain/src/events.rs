//! Versioned world deltas.
//!
//! Every committed mutation produces exactly one `WorldUpdate` whose
//! `base_version` is the pre-mutation version. Receivers apply updates
//! idempotently keyed by `version`: duplicates are skipped, gaps are
//! reported so the client can fetch a fresh snapshot.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::ItemInstance;
use crate::ids::{AreaId, InstanceId, LocationId, NpcId, SpotId};

/// Canonical container path of a spot.
///
/// Lookup and removal both go through this one representation; there is
/// no second way to address a container, which is what makes a
/// remove-then-add move atomic in effect (an item can never be left
/// behind at a path the write side spelled differently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPath {
    pub location_id: LocationId,
    pub area_id: AreaId,
    pub spot_id: SpotId,
}

impl SpotPath {
    pub fn new(location_id: LocationId, area_id: AreaId, spot_id: SpotId) -> Self {
        Self {
            location_id,
            area_id,
            spot_id,
        }
    }

    /// Rendered path of the spot itself.
    pub fn render(&self) -> String {
        format!(
            "locations.{}.areas.{}.spots.{}",
            self.location_id, self.area_id, self.spot_id
        )
    }

    /// Rendered path of the spot's item container.
    pub fn item_path(&self, instance_id: InstanceId) -> String {
        format!(
            "locations.{}.areas.{}.spots.{}.items.{}",
            self.location_id, self.area_id, self.spot_id, instance_id
        )
    }

    /// Rendered path of an NPC in this spot.
    pub fn npc_path(&self, npc_id: NpcId) -> String {
        format!(
            "locations.{}.areas.{}.spots.{}.npcs.{}",
            self.location_id, self.area_id, self.spot_id, npc_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Add,
    Remove,
    Update,
}

/// One change inside a `WorldUpdate`.
///
/// `path` is the rendered form for clients; `spot`/`npc_id` carry the
/// structured target so `World::apply_update` does not parse strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldChange {
    pub operation: ChangeOperation,
    pub area_id: AreaId,
    pub instance_id: InstanceId,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemInstance>,
    pub spot: SpotPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_id: Option<NpcId>,
}

impl WorldChange {
    pub fn item_added(spot: SpotPath, item: ItemInstance) -> Self {
        Self {
            operation: ChangeOperation::Add,
            area_id: spot.area_id,
            instance_id: item.instance_id,
            path: spot.item_path(item.instance_id),
            item: Some(item),
            spot,
            npc_id: None,
        }
    }

    pub fn item_removed(spot: SpotPath, instance_id: InstanceId) -> Self {
        Self {
            operation: ChangeOperation::Remove,
            area_id: spot.area_id,
            instance_id,
            path: spot.item_path(instance_id),
            item: None,
            spot,
            npc_id: None,
        }
    }

    /// An NPC accepted an item (the item itself rides along so a
    /// projected world stays identical to a fresh snapshot).
    pub fn npc_received(spot: SpotPath, npc_id: NpcId, item: ItemInstance) -> Self {
        Self {
            operation: ChangeOperation::Update,
            area_id: spot.area_id,
            instance_id: item.instance_id,
            path: spot.npc_path(npc_id),
            item: Some(item),
            spot,
            npc_id: Some(npc_id),
        }
    }
}

/// The wire delta for one committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldUpdate {
    /// World version after this mutation.
    pub version: u64,
    /// World version this delta applies atop (always `version - 1`).
    pub base_version: u64,
    /// Version of the last full snapshot the recipient holds.
    pub snapshot_version: u64,
    pub changes: Vec<WorldChange>,
}

/// Result of applying a delta to a projected world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Duplicate delivery; state unchanged.
    AlreadyApplied,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The delta does not connect to the projected version; the client
    /// must request a fresh snapshot.
    #[error("version gap: have {have}, update applies atop {update_base}")]
    VersionGap { have: u64, update_base: u64 },

    /// The delta references a container the projection does not have.
    #[error("unknown container: {0}")]
    UnknownContainer(String),
}
