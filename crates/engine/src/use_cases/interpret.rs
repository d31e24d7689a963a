//! The slow path: free-text commands.
//!
//! Builds the player/world context the interpretation collaborator
//! needs, forwards the text, and hands back either a structured action
//! (which the router re-dispatches through the fast path) or narrative
//! text to forward verbatim.

use std::sync::Arc;

use waypoint_domain::{ExperienceId, UserId};

use crate::infrastructure::ports::{Interpretation, InterpreterContext, InterpreterPort};
use crate::stores::{PlayerViewStore, WorldStore};

use super::actions::ActionError;

pub struct InterpretCommand {
    interpreter: Arc<dyn InterpreterPort>,
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
}

impl InterpretCommand {
    pub fn new(
        interpreter: Arc<dyn InterpreterPort>,
        worlds: Arc<WorldStore>,
        players: Arc<PlayerViewStore>,
    ) -> Self {
        Self {
            interpreter,
            worlds,
            players,
        }
    }

    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        text: &str,
    ) -> Result<Interpretation, ActionError> {
        let context = self.build_context(experience_id, user_id).await;
        let interpretation = self.interpreter.interpret(text, context).await?;
        Ok(interpretation)
    }

    async fn build_context(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> InterpreterContext {
        let mut context = InterpreterContext {
            user_id: user_id.to_string(),
            ..InterpreterContext::default()
        };

        let Some(view) = self.players.snapshot(experience_id, user_id).await else {
            return context;
        };
        context.inventory = view
            .inventory
            .iter()
            .map(|i| i.semantic_name.clone())
            .collect();

        let Some(location_id) = view.current_location else {
            return context;
        };

        let surroundings = self
            .worlds
            .with_world(experience_id, move |world| {
                let Some(location) = world.location(location_id) else {
                    return Ok(None);
                };
                let mut items = Vec::new();
                let mut npcs = Vec::new();
                for area in location.areas.values() {
                    for spot in area.spots.values() {
                        items.extend(
                            spot.items
                                .values()
                                .filter(|i| i.visible)
                                .map(|i| i.semantic_name.clone()),
                        );
                        npcs.extend(spot.npcs.values().map(|n| n.name.clone()));
                    }
                }
                Ok(Some((location.name.clone(), items, npcs)))
            })
            .await;

        if let Ok(Some((name, items, npcs))) = surroundings {
            context.location_name = Some(name);
            context.visible_items = items;
            context.npcs_present = npcs;
        }

        context
    }
}
