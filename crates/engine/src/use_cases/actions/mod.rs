//! Structured fast-path actions.
//!
//! One use case per command; none of them reference the interpretation
//! port, which is what keeps the fast path's latency bounded by
//! in-process work.

mod collect_item;
mod drop_item;
mod error;
mod examine;
mod give_item;
mod go;
mod inventory;
mod update_location;
mod use_item;

pub use collect_item::{CollectItem, CollectOutcome};
pub use drop_item::{DropItem, DropOutcome};
pub use error::ActionError;
pub use examine::Examine;
pub use give_item::{GiveItem, GiveOutcome};
pub use go::{Go, GoOutcome};
pub use inventory::InventoryQuery;
pub use update_location::{UpdateLocation, UpdateLocationOutcome};
pub use use_item::{UseItem, UseOutcome};

use waypoint_domain::{InstanceId, NpcId, WorldError};

/// Parse a wire-format id field, mapping bad input to a validation
/// failure rather than a 500.
pub(crate) fn parse_instance_id(raw: &str) -> Result<InstanceId, ActionError> {
    raw.parse::<InstanceId>()
        .map_err(|_| WorldError::validation(format!("'{raw}' is not a valid instance id")).into())
}

pub(crate) fn parse_npc_id(raw: &str) -> Result<NpcId, ActionError> {
    raw.parse::<NpcId>()
        .map_err(|_| WorldError::validation(format!("'{raw}' is not a valid npc id")).into())
}

/// Container for all structured-action use cases.
pub struct ActionUseCases {
    pub collect: std::sync::Arc<CollectItem>,
    pub drop: std::sync::Arc<DropItem>,
    pub give: std::sync::Arc<GiveItem>,
    pub use_item: std::sync::Arc<UseItem>,
    pub examine: std::sync::Arc<Examine>,
    pub go: std::sync::Arc<Go>,
    pub update_location: std::sync::Arc<UpdateLocation>,
    pub inventory: std::sync::Arc<InventoryQuery>,
}
