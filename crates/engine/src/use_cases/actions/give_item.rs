//! Give item use case.
//!
//! Hands an inventory item to an NPC at the player's location. Quest
//! rules (symbol match, completion idempotence) are checked before
//! anything commits; a rule failure mutates nothing and produces a
//! descriptive refusal, not a generic error.
//!
//! The commit is optimistic: validation reads a world snapshot, the
//! write is applied at that version. If a concurrent mutation moved the
//! world in between, the store answers `Conflict`; validation re-runs
//! against fresh state and the commit is retried exactly once.

use std::sync::Arc;

use waypoint_domain::{
    DeliveryOutcome, ExperienceId, ItemInstance, LocationId, NpcId, NpcInstance, QuestDefinition,
    QuestState, SpotPath, UserId, WorldError, WorldUpdate,
};

use crate::stores::{PlayerViewStore, WorldStore};
use crate::use_cases::quest::QuestEngine;

use super::error::ActionError;
use super::{parse_instance_id, parse_npc_id};

pub struct GiveItem {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

#[derive(Debug)]
pub struct GiveOutcome {
    pub item_name: String,
    pub npc_name: String,
    pub update: WorldUpdate,
    pub quest: Option<QuestProgress>,
}

#[derive(Debug)]
pub struct QuestProgress {
    pub state: QuestState,
    pub just_completed: bool,
}

struct DeliveryTarget {
    version: u64,
    path: SpotPath,
    npc: NpcInstance,
    quest: Option<QuestDefinition>,
}

impl GiveItem {
    pub fn new(worlds: Arc<WorldStore>, players: Arc<PlayerViewStore>) -> Self {
        Self { worlds, players }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        raw_instance_id: &str,
        raw_npc_id: &str,
    ) -> Result<GiveOutcome, ActionError> {
        let instance_id = parse_instance_id(raw_instance_id)?;
        let npc_id = parse_npc_id(raw_npc_id)?;

        let view = self.players.get_or_create(experience_id, user_id);
        let mut view = view.lock().await;

        let location_id = view
            .current_location
            .ok_or_else(|| WorldError::precondition("you are not at any location"))?;
        let item = view
            .inventory_item(instance_id)
            .cloned()
            .ok_or_else(|| WorldError::precondition("that item is not in your inventory"))?;

        let target = self.read_target(experience_id, npc_id, location_id).await?;
        self.validate(&view, &item, &target)?;

        let update = match self
            .worlds
            .give_item(
                experience_id,
                target.version,
                target.path,
                npc_id,
                item.clone(),
            )
            .await
        {
            Err(WorldError::Conflict { .. }) => {
                // Another mutation landed between read and write.
                // Re-validate against fresh state, then retry once.
                let target = self.read_target(experience_id, npc_id, location_id).await?;
                self.validate(&view, &item, &target)?;
                self.worlds
                    .give_item(
                        experience_id,
                        target.version,
                        target.path,
                        npc_id,
                        item.clone(),
                    )
                    .await?
            }
            other => other?,
        };

        view.take_from_inventory(instance_id)?;

        let quest = match &target.quest {
            Some(definition) => {
                let state = view.quest_mut(definition.id, definition.bottles_total);
                let outcome = state.record_delivery()?;
                Some(QuestProgress {
                    state: state.clone(),
                    just_completed: outcome == DeliveryOutcome::Completed,
                })
            }
            None => None,
        };

        Ok(GiveOutcome {
            item_name: item.semantic_name,
            npc_name: target.npc.name,
            update,
            quest,
        })
    }

    async fn read_target(
        &self,
        experience_id: ExperienceId,
        npc_id: NpcId,
        location_id: LocationId,
    ) -> Result<DeliveryTarget, ActionError> {
        let target = self
            .worlds
            .with_world(experience_id, move |world| {
                let (path, npc) = world
                    .find_npc(npc_id)
                    .ok_or_else(|| WorldError::not_found("npc", npc_id))?;
                if path.location_id != location_id {
                    return Err(WorldError::precondition(format!(
                        "{} is not at your location",
                        npc.name
                    )));
                }
                let quest = npc.quest_id.and_then(|id| world.quest(id).cloned());
                Ok(DeliveryTarget {
                    version: world.version,
                    path,
                    npc: npc.clone(),
                    quest,
                })
            })
            .await?;
        Ok(target)
    }

    fn validate(
        &self,
        view: &waypoint_domain::PlayerView,
        item: &ItemInstance,
        target: &DeliveryTarget,
    ) -> Result<(), ActionError> {
        QuestEngine::validate_symbol(item, &target.npc)?;
        if let Some(quest) = &target.quest {
            QuestEngine::ensure_not_complete(view, quest)?;
        }
        Ok(())
    }
}
