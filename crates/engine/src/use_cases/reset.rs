//! Two-phase reset.
//!
//! A reset is previewed first: the preview mutates nothing, describes
//! what would happen, and mints a single-use confirm token bound to the
//! requested scope. Execution presents that token; a missing, consumed,
//! or scope-mismatched token is refused before anything is touched.
//!
//! The experience-scoped reset backs up the current world before
//! restoring from the authoritative template, then deletes every player
//! view. Ordinary mutations arriving while it runs are rejected with
//! `TransientUnavailable` by the world store's reset flag.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use waypoint_domain::{ExperienceId, InstanceId, UserId, WorldError};
use waypoint_shared::{ResetMetadata, ResetScope};

use crate::infrastructure::broadcaster::EventBroadcaster;
use crate::infrastructure::ports::TemplateStorePort;
use crate::stores::{PlayerViewStore, WorldStore};

use super::actions::ActionError;

/// What a preview promises.
#[derive(Debug, Clone)]
pub struct ResetPreview {
    pub description: String,
    pub confirm_token: String,
}

pub struct ResetManager {
    worlds: Arc<WorldStore>,
    players: Arc<PlayerViewStore>,
    templates: Arc<dyn TemplateStorePort>,
    broadcaster: Arc<EventBroadcaster>,
    /// Outstanding confirm tokens, each bound to the scope it was
    /// previewed for. Consumed on execute.
    pending: DashMap<String, (ExperienceId, ResetScope)>,
}

impl ResetManager {
    pub fn new(
        worlds: Arc<WorldStore>,
        players: Arc<PlayerViewStore>,
        templates: Arc<dyn TemplateStorePort>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            worlds,
            players,
            templates,
            broadcaster,
            pending: DashMap::new(),
        }
    }

    /// Phase one: describe the reset and mint its confirm token. No
    /// world or player state changes here.
    pub async fn preview(
        &self,
        experience_id: ExperienceId,
        scope: ResetScope,
    ) -> Result<ResetPreview, ActionError> {
        let description = match &scope {
            ResetScope::Experience => {
                let world = self.worlds.snapshot(experience_id).await?;
                let views = self.players.count_for_experience(experience_id);
                format!(
                    "Restore '{}' from its template (currently at version {}), \
                     take a backup first, and delete {} player view(s)",
                    world.name, world.version, views
                )
            }
            ResetScope::Player { user_id } => {
                let user = UserId::new(user_id.clone());
                match self.players.snapshot(experience_id, &user).await {
                    Some(view) => format!(
                        "Delete the view for player '{}' ({} item(s) in inventory); \
                         the world is untouched",
                        user,
                        view.inventory.len()
                    ),
                    None => format!("Player '{user}' has no view; nothing would change"),
                }
            }
            ResetScope::Instance { instance_id } => {
                let instance_id = parse_wire_instance_id(instance_id)?;
                let template = self.load_template(experience_id).await?;
                if !template_contains(&template, instance_id) {
                    return Err(
                        WorldError::not_found("template instance", instance_id).into()
                    );
                }
                format!("Return instance {instance_id} to the spot its template places it in")
            }
        };

        let confirm_token = Uuid::new_v4().to_string();
        self.pending
            .insert(confirm_token.clone(), (experience_id, scope));

        Ok(ResetPreview {
            description,
            confirm_token,
        })
    }

    /// Phase two: execute, authorized by a token the preview minted for
    /// exactly this scope. The token is consumed even when execution
    /// later fails; re-running a reset requires a fresh preview.
    pub async fn execute(
        &self,
        experience_id: ExperienceId,
        scope: ResetScope,
        confirm_token: &str,
    ) -> Result<ResetMetadata, ActionError> {
        let Some((_, (minted_for, minted_scope))) = self.pending.remove(confirm_token) else {
            return Err(WorldError::precondition(
                "unknown or already-used confirm token; preview the reset first",
            )
            .into());
        };
        if minted_for != experience_id || minted_scope != scope {
            return Err(WorldError::precondition(
                "confirm token was minted for a different reset",
            )
            .into());
        }

        match scope {
            ResetScope::Experience => self.execute_experience(experience_id).await,
            ResetScope::Player { user_id } => {
                let user = UserId::new(user_id);
                let deleted = self.players.delete(experience_id, &user);
                tracing::info!(experience_id = %experience_id, user_id = %user, deleted, "Player reset executed");
                Ok(ResetMetadata {
                    reset_type: "player".to_string(),
                    world_restored: false,
                    player_views_deleted: usize::from(deleted),
                    backup_created: None,
                })
            }
            ResetScope::Instance { instance_id } => {
                self.execute_instance(experience_id, &instance_id).await
            }
        }
    }

    async fn execute_experience(
        &self,
        experience_id: ExperienceId,
    ) -> Result<ResetMetadata, ActionError> {
        let template = self.load_template(experience_id).await?;

        // The guard rejects ordinary mutations for the duration and is
        // released on every exit path below.
        let guard = self.worlds.begin_reset(experience_id)?;

        let current = self.worlds.snapshot(experience_id).await?;
        let backup_id = self.templates.save_backup(&current).await?;

        self.worlds
            .replace_world(experience_id, template.instantiate())
            .await?;
        let deleted = self.players.delete_for_experience(experience_id);
        drop(guard);

        tracing::info!(
            experience_id = %experience_id,
            backup_id = %backup_id,
            player_views_deleted = deleted,
            "Experience reset executed"
        );

        Ok(ResetMetadata {
            reset_type: "experience".to_string(),
            world_restored: true,
            player_views_deleted: deleted,
            backup_created: Some(backup_id.to_string()),
        })
    }

    async fn execute_instance(
        &self,
        experience_id: ExperienceId,
        raw_instance_id: &str,
    ) -> Result<ResetMetadata, ActionError> {
        let instance_id = parse_wire_instance_id(raw_instance_id)?;
        let template = self.load_template(experience_id).await?;

        // Whoever holds the instance loses it first, so the restore can
        // never leave it in two containers.
        self.players
            .remove_instance_everywhere(experience_id, instance_id)
            .await;

        let update = self
            .worlds
            .restore_instance(experience_id, instance_id, &template)
            .await?;
        self.broadcaster.broadcast_update(experience_id, &update).await;

        tracing::info!(experience_id = %experience_id, instance_id = %instance_id, "Instance reset executed");

        Ok(ResetMetadata {
            reset_type: "instance".to_string(),
            world_restored: false,
            player_views_deleted: 0,
            backup_created: None,
        })
    }

    async fn load_template(
        &self,
        experience_id: ExperienceId,
    ) -> Result<waypoint_domain::WorldTemplate, ActionError> {
        self.templates
            .load_template(experience_id)
            .await?
            .ok_or_else(|| WorldError::not_found("world template", experience_id).into())
    }
}

fn parse_wire_instance_id(raw: &str) -> Result<InstanceId, ActionError> {
    raw.parse::<InstanceId>()
        .map_err(|_| WorldError::validation(format!("'{raw}' is not a valid instance id")).into())
}

fn template_contains(template: &waypoint_domain::WorldTemplate, instance_id: InstanceId) -> bool {
    template.locations.values().any(|location| {
        location.areas.values().any(|area| {
            area.spots
                .values()
                .any(|spot| spot.items.contains_key(&instance_id))
        })
    })
}
