//! Quest definitions and per-player quest progress.
//!
//! A quest counts valid deliveries toward a total. The state machine is
//! `not_started → in_progress → complete`, with `complete` terminal:
//! further deliveries are rejected rather than double-counted.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::ids::QuestId;

/// Template-side quest description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: QuestId,
    pub name: String,
    /// Number of valid deliveries required to complete the quest.
    pub bottles_total: u32,
}

impl QuestDefinition {
    pub fn new(name: impl Into<String>, bottles_total: u32) -> Self {
        Self {
            id: QuestId::new(),
            name: name.into(),
            bottles_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    NotStarted,
    InProgress,
    Complete,
}

/// What a recorded delivery did to the quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Progressed,
    /// This delivery was the last one; the quest just completed.
    Completed,
}

/// Per-player progress for one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestState {
    pub quest_id: QuestId,
    pub status: QuestStatus,
    pub bottles_collected: u32,
    pub bottles_total: u32,
}

impl QuestState {
    pub fn new(quest_id: QuestId, bottles_total: u32) -> Self {
        Self {
            quest_id,
            status: QuestStatus::NotStarted,
            bottles_collected: 0,
            bottles_total,
        }
    }

    /// Record one valid delivery.
    ///
    /// Completing delivery returns `DeliveryOutcome::Completed` exactly
    /// once; any delivery after completion fails with
    /// `PreconditionFailed` and leaves the counters untouched.
    pub fn record_delivery(&mut self) -> Result<DeliveryOutcome, WorldError> {
        if self.status == QuestStatus::Complete {
            return Err(WorldError::precondition("quest is already complete"));
        }

        self.bottles_collected += 1;
        if self.bottles_collected >= self.bottles_total {
            self.status = QuestStatus::Complete;
            Ok(DeliveryOutcome::Completed)
        } else {
            self.status = QuestStatus::InProgress;
            Ok(DeliveryOutcome::Progressed)
        }
    }
}
