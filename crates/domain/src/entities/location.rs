//! The containment tree below a world: Location → Area → Spot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{ItemInstance, NpcInstance};
use crate::ids::{AreaId, InstanceId, LocationId, NpcId, SpotId};
use crate::value_objects::GpsCoord;

/// A physical place a player can be at, anchored to GPS coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub gps: GpsCoord,
    pub areas: HashMap<AreaId, Area>,
}

impl Location {
    pub fn new(name: impl Into<String>, description: impl Into<String>, gps: GpsCoord) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: description.into(),
            gps,
            areas: HashMap::new(),
        }
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.insert(area.id, area);
        self
    }
}

/// A sublocation grouping spots (a room, a courtyard corner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub spots: HashMap<SpotId, Spot>,
}

impl Area {
    pub fn new() -> Self {
        Self {
            id: AreaId::new(),
            spots: HashMap::new(),
        }
    }

    pub fn with_spot(mut self, spot: Spot) -> Self {
        self.spots.insert(spot.id, spot);
        self
    }
}

impl Default for Area {
    fn default() -> Self {
        Self::new()
    }
}

/// The leaf container holding item and NPC instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub items: HashMap<InstanceId, ItemInstance>,
    pub npcs: HashMap<NpcId, NpcInstance>,
}

impl Spot {
    pub fn new() -> Self {
        Self {
            id: SpotId::new(),
            items: HashMap::new(),
            npcs: HashMap::new(),
        }
    }

    pub fn with_item(mut self, item: ItemInstance) -> Self {
        self.items.insert(item.instance_id, item);
        self
    }

    pub fn with_npc(mut self, npc: NpcInstance) -> Self {
        self.npcs.insert(npc.npc_id, npc);
        self
    }
}

impl Default for Spot {
    fn default() -> Self {
        Self::new()
    }
}
