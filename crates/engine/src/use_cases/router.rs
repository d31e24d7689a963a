//! Command classification and dispatch.
//!
//! Every inbound client message passes through here before any state is
//! touched. Structured actions are validated against the schema table
//! and handled entirely in-process; free text is delegated to the
//! interpretation collaborator and, if it resolves to a structured
//! action, re-enters the structured path.
//!
//! Each command produces exactly one direct reply carrying its outcome
//! (an `action_response`, or `pong` for ping). World deltas and quest
//! progress do not ride the reply: they are published through the event
//! broadcaster and reach the originator over their own subscription,
//! the same way they reach everyone else.

use std::sync::Arc;

use serde_json::json;

use waypoint_domain::{ExperienceId, UserId};
use waypoint_shared::{
    validate_action, ActionRequest, ClientMessage, CommandSchemaData, ResetScope, ServerMessage,
    COMMAND_SCHEMAS,
};
use waypoint_shared::{ActionResponseData, AoiItemData};

use crate::infrastructure::broadcaster::EventBroadcaster;
use crate::infrastructure::ports::{ClockPort, Interpretation};

use super::actions::{ActionError, ActionUseCases};
use super::aoi::BuildAreaOfInterest;
use super::interpret::InterpretCommand;
use super::reset::ResetManager;

/// Direct replies owed to the connection that issued the command.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub replies: Vec<ServerMessage>,
}

impl DispatchOutcome {
    fn reply(message: ServerMessage) -> Self {
        Self {
            replies: vec![message],
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::reply(ServerMessage::ActionResponse(ActionResponseData::failure(
            message,
        )))
    }
}

pub struct CommandRouter {
    actions: ActionUseCases,
    aoi: Arc<BuildAreaOfInterest>,
    interpret: Arc<InterpretCommand>,
    reset: Arc<ResetManager>,
    broadcaster: Arc<EventBroadcaster>,
    clock: Arc<dyn ClockPort>,
}

impl CommandRouter {
    pub fn new(
        actions: ActionUseCases,
        aoi: Arc<BuildAreaOfInterest>,
        interpret: Arc<InterpretCommand>,
        reset: Arc<ResetManager>,
        broadcaster: Arc<EventBroadcaster>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            actions,
            aoi,
            interpret,
            reset,
            broadcaster,
            clock,
        }
    }

    pub async fn dispatch(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        message: ClientMessage,
    ) -> DispatchOutcome {
        match message {
            ClientMessage::Action(request) => {
                self.dispatch_action(experience_id, user_id, request).await
            }
            ClientMessage::Text { text } => self.dispatch_text(experience_id, user_id, &text).await,
            ClientMessage::CommandsSchema => DispatchOutcome::reply(ServerMessage::CommandsSchema {
                commands: COMMAND_SCHEMAS.iter().map(CommandSchemaData::from).collect(),
            }),
            ClientMessage::PreviewReset { scope } => {
                self.dispatch_preview_reset(experience_id, scope).await
            }
            ClientMessage::ExecuteReset {
                scope,
                confirm_token,
            } => {
                self.dispatch_execute_reset(experience_id, scope, &confirm_token)
                    .await
            }
        }
    }

    /// The fast path. Never touches the interpreter port.
    async fn dispatch_action(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        request: ActionRequest,
    ) -> DispatchOutcome {
        if let Err(e) = validate_action(&request) {
            return DispatchOutcome::failure(e.to_string());
        }

        let outcome = self.execute_action(experience_id, user_id, &request).await;
        match outcome {
            Ok(outcome) => {
                tracing::info!(action = %request.action, user_id = %user_id, "Action dispatched");
                outcome
            }
            Err(e) => {
                tracing::debug!(action = %request.action, user_id = %user_id, error = %e, "Action refused");
                DispatchOutcome::failure(e.user_message())
            }
        }
    }

    async fn execute_action(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        request: &ActionRequest,
    ) -> Result<DispatchOutcome, ActionError> {
        use waypoint_shared::ActionName;

        match request.action {
            ActionName::CollectItem => {
                let Some(instance_id) = request.instance_id.as_deref() else {
                    return Ok(DispatchOutcome::failure("instance_id is required"));
                };
                let outcome = self
                    .actions
                    .collect
                    .execute(experience_id, user_id, instance_id)
                    .await?;
                self.broadcaster
                    .broadcast_update(experience_id, &outcome.update)
                    .await;
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(format!(
                        "You pick up the {}",
                        outcome.item.semantic_name
                    ))
                    .with_item_id(outcome.item.instance_id.to_string()),
                )))
            }
            ActionName::DropItem => {
                let Some(instance_id) = request.instance_id.as_deref() else {
                    return Ok(DispatchOutcome::failure("instance_id is required"));
                };
                let outcome = self
                    .actions
                    .drop
                    .execute(experience_id, user_id, instance_id)
                    .await?;
                self.broadcaster
                    .broadcast_update(experience_id, &outcome.update)
                    .await;
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(format!("You drop the {}", outcome.item_name))
                        .with_item_id(instance_id),
                )))
            }
            ActionName::GiveItem => {
                let (Some(instance_id), Some(npc_id)) = (
                    request.instance_id.as_deref(),
                    request.target_npc_id.as_deref(),
                ) else {
                    return Ok(DispatchOutcome::failure(
                        "instance_id and target_npc_id are required",
                    ));
                };
                let outcome = self
                    .actions
                    .give
                    .execute(experience_id, user_id, instance_id, npc_id)
                    .await?;
                self.broadcaster
                    .broadcast_update(experience_id, &outcome.update)
                    .await;
                if let Some(quest) = &outcome.quest {
                    let data = waypoint_shared::QuestUpdateData::from(&quest.state);
                    self.broadcaster
                        .publish_to_user(
                            experience_id,
                            user_id,
                            ServerMessage::QuestUpdate(data.clone()),
                        )
                        .await;
                    if quest.just_completed {
                        self.broadcaster
                            .publish_to_user(
                                experience_id,
                                user_id,
                                ServerMessage::QuestComplete(data),
                            )
                            .await;
                    }
                }
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(format!(
                        "{} accepts the {}",
                        outcome.npc_name, outcome.item_name
                    ))
                    .with_item_id(instance_id),
                )))
            }
            ActionName::UseItem => {
                let Some(instance_id) = request.instance_id.as_deref() else {
                    return Ok(DispatchOutcome::failure("instance_id is required"));
                };
                let outcome = self
                    .actions
                    .use_item
                    .execute(experience_id, user_id, instance_id)
                    .await?;
                let message = if outcome.consumed {
                    format!("You use the {}; it is spent", outcome.item_name)
                } else {
                    format!("You use the {}", outcome.item_name)
                };
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(message).with_item_id(instance_id),
                )))
            }
            ActionName::Examine => {
                let Some(instance_id) = request.instance_id.as_deref() else {
                    return Ok(DispatchOutcome::failure("instance_id is required"));
                };
                let description = self
                    .actions
                    .examine
                    .execute(experience_id, user_id, instance_id)
                    .await?;
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(description).with_item_id(instance_id),
                )))
            }
            ActionName::Inventory => {
                let items = self
                    .actions
                    .inventory
                    .execute(experience_id, user_id)
                    .await?;
                let message = inventory_message(&items);
                Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok(message)
                        .with_metadata(json!({ "inventory": items })),
                )))
            }
            ActionName::Go => {
                let Some(destination) = request.destination.as_deref() else {
                    return Ok(DispatchOutcome::failure("destination is required"));
                };
                let outcome = self
                    .actions
                    .go
                    .execute(experience_id, user_id, destination)
                    .await?;
                let aoi = self.fresh_aoi(experience_id, user_id).await?;
                Ok(DispatchOutcome {
                    replies: vec![
                        ServerMessage::ActionResponse(ActionResponseData::ok(format!(
                            "You arrive at {}",
                            outcome.location_name
                        ))),
                        ServerMessage::AreaOfInterest(aoi),
                    ],
                })
            }
            ActionName::UpdateLocation => {
                let Some(gps) = request.gps else {
                    return Ok(DispatchOutcome::failure("gps is required"));
                };
                let outcome = self
                    .actions
                    .update_location
                    .execute(experience_id, user_id, gps)
                    .await?;
                match outcome.zone {
                    Some((_, name)) => {
                        let aoi = self.fresh_aoi(experience_id, user_id).await?;
                        Ok(DispatchOutcome {
                            replies: vec![
                                ServerMessage::ActionResponse(ActionResponseData::ok(format!(
                                    "You are at {name}"
                                ))),
                                ServerMessage::AreaOfInterest(aoi),
                            ],
                        })
                    }
                    None => Ok(DispatchOutcome::reply(ServerMessage::ActionResponse(
                        ActionResponseData::ok("You are not near any zone"),
                    ))),
                }
            }
            ActionName::Ping => Ok(DispatchOutcome::reply(ServerMessage::Pong {
                timestamp: request.timestamp,
                server_time: self.clock.now().to_rfc3339(),
            })),
        }
    }

    /// The slow path. Unbounded latency; an interpretation that resolves
    /// to a structured action re-enters the fast path above.
    async fn dispatch_text(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        text: &str,
    ) -> DispatchOutcome {
        match self.interpret.execute(experience_id, user_id, text).await {
            Ok(Interpretation::Action(request)) => {
                tracing::info!(action = %request.action, user_id = %user_id, "Free text resolved to action");
                self.dispatch_action(experience_id, user_id, request).await
            }
            Ok(Interpretation::Narrative(narrative)) => {
                DispatchOutcome::reply(ServerMessage::ActionResponse(ActionResponseData::ok(
                    narrative,
                )))
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Interpretation failed");
                DispatchOutcome::failure(e.user_message())
            }
        }
    }

    async fn dispatch_preview_reset(
        &self,
        experience_id: ExperienceId,
        scope: ResetScope,
    ) -> DispatchOutcome {
        match self.reset.preview(experience_id, scope).await {
            Ok(preview) => DispatchOutcome::reply(ServerMessage::ActionResponse(
                ActionResponseData::ok(preview.description)
                    .with_metadata(json!({ "confirm_token": preview.confirm_token })),
            )),
            Err(e) => DispatchOutcome::failure(e.user_message()),
        }
    }

    async fn dispatch_execute_reset(
        &self,
        experience_id: ExperienceId,
        scope: ResetScope,
        confirm_token: &str,
    ) -> DispatchOutcome {
        match self.reset.execute(experience_id, scope, confirm_token).await {
            Ok(metadata) => {
                let value = match serde_json::to_value(&metadata) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize reset metadata");
                        json!({ "reset_type": metadata.reset_type })
                    }
                };
                DispatchOutcome::reply(ServerMessage::ActionResponse(
                    ActionResponseData::ok("Reset executed").with_metadata(value),
                ))
            }
            Err(e) => DispatchOutcome::failure(e.user_message()),
        }
    }

    /// Build an AOI snapshot and record its version as the recipient's
    /// new delta baseline.
    async fn fresh_aoi(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> Result<waypoint_shared::AreaOfInterestData, ActionError> {
        let data = self.aoi.execute(experience_id, user_id).await?;
        self.broadcaster
            .record_snapshot(experience_id, user_id, data.snapshot_version);
        Ok(data)
    }
}

fn inventory_message(items: &[AoiItemData]) -> String {
    if items.is_empty() {
        return "You are carrying nothing".to_string();
    }
    let names: Vec<&str> = items.iter().map(|i| i.semantic_name.as_str()).collect();
    format!("You are carrying: {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broker::InProcessBroker;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::{
        BrokerPort, InterpreterError, MockInterpreterPort, MockTemplateStorePort,
    };
    use crate::infrastructure::broadcaster::user_subject;
    use crate::stores::{PlayerViewStore, WorldStore};
    use crate::use_cases::actions::{
        CollectItem, DropItem, Examine, GiveItem, Go, InventoryQuery, UpdateLocation, UseItem,
    };
    use waypoint_domain::{
        Area, GpsCoord, InstanceId, ItemInstance, Location, Spot, TemplateId, World,
    };
    use waypoint_shared::ActionName;

    struct Fixture {
        router: CommandRouter,
        broker: Arc<InProcessBroker>,
        experience_id: ExperienceId,
        instance_id: InstanceId,
    }

    fn fixture(interpreter: MockInterpreterPort) -> Fixture {
        let item = ItemInstance::new(TemplateId::new(), "spiral bottle");
        let instance_id = item.instance_id;
        let location = Location::new("Pier", "The old pier", GpsCoord::new(52.0, 13.0))
            .with_area(Area::new().with_spot(Spot::new().with_item(item)));
        let world = World::new("harbor").with_location(location);
        let experience_id = world.id;

        let worlds = Arc::new(WorldStore::new());
        worlds.provision(world);
        let players = Arc::new(PlayerViewStore::new());
        let broker = Arc::new(InProcessBroker::new());
        let broadcaster = Arc::new(EventBroadcaster::new(broker.clone()));
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let interpreter: Arc<dyn crate::infrastructure::ports::InterpreterPort> =
            Arc::new(interpreter);

        let actions = ActionUseCases {
            collect: Arc::new(CollectItem::new(worlds.clone(), players.clone())),
            drop: Arc::new(DropItem::new(worlds.clone(), players.clone())),
            give: Arc::new(GiveItem::new(worlds.clone(), players.clone())),
            use_item: Arc::new(UseItem::new(players.clone())),
            examine: Arc::new(Examine::new(worlds.clone(), players.clone())),
            go: Arc::new(Go::new(worlds.clone(), players.clone())),
            update_location: Arc::new(UpdateLocation::new(worlds.clone(), players.clone())),
            inventory: Arc::new(InventoryQuery::new(players.clone())),
        };
        let aoi = Arc::new(BuildAreaOfInterest::new(
            worlds.clone(),
            players.clone(),
            clock.clone(),
        ));
        let interpret = Arc::new(InterpretCommand::new(
            interpreter,
            worlds.clone(),
            players.clone(),
        ));
        let reset = Arc::new(ResetManager::new(
            worlds,
            players,
            Arc::new(MockTemplateStorePort::new()),
            broadcaster.clone(),
        ));

        Fixture {
            router: CommandRouter::new(actions, aoi, interpret, reset, broadcaster, clock),
            broker,
            experience_id,
            instance_id,
        }
    }

    /// An interpreter that must never be called.
    fn untouchable_interpreter() -> MockInterpreterPort {
        let mut mock = MockInterpreterPort::new();
        mock.expect_interpret().never();
        mock
    }

    #[tokio::test]
    async fn structured_collect_never_invokes_the_interpreter() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        // Walk there, then collect; both are fast-path commands.
        let go = ClientMessage::Action(
            ActionRequest::new(ActionName::Go).with_destination("Pier"),
        );
        let outcome = fx.router.dispatch(fx.experience_id, &user, go).await;
        assert!(matches!(
            outcome.replies[0],
            ServerMessage::ActionResponse(ActionResponseData { success: true, .. })
        ));
        assert!(matches!(
            outcome.replies[1],
            ServerMessage::AreaOfInterest(_)
        ));

        let collect = ClientMessage::Action(
            ActionRequest::new(ActionName::CollectItem)
                .with_instance(fx.instance_id.to_string()),
        );
        let outcome = fx.router.dispatch(fx.experience_id, &user, collect).await;
        assert_eq!(outcome.replies.len(), 1);
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => {
                assert!(data.success);
                assert_eq!(data.item_id, Some(fx.instance_id.to_string()));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn committed_collect_broadcasts_a_world_update() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        fx.router
            .dispatch(
                fx.experience_id,
                &user,
                ClientMessage::Action(ActionRequest::new(ActionName::Go).with_destination("Pier")),
            )
            .await;

        // Subscribe the way a session would.
        let subject = user_subject(fx.experience_id, &user);
        let (_, mut rx) = fx.broker.subscribe(&subject).await.expect("subscribes");

        fx.router
            .dispatch(
                fx.experience_id,
                &user,
                ClientMessage::Action(
                    ActionRequest::new(ActionName::CollectItem)
                        .with_instance(fx.instance_id.to_string()),
                ),
            )
            .await;

        match rx.recv().await {
            Some(ServerMessage::WorldUpdate(update)) => {
                assert_eq!(update.version, 1);
                assert_eq!(update.base_version, 0);
                // The AOI sent by `go` is this recipient's baseline.
                assert_eq!(update.snapshot_version, 0);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_structured_command_fails_before_any_mutation() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        let incomplete = ClientMessage::Action(ActionRequest::new(ActionName::CollectItem));
        let outcome = fx.router.dispatch(fx.experience_id, &user, incomplete).await;
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => {
                assert!(!data.success);
                assert!(data.message.contains("instance_id"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn free_text_resolving_to_an_action_reenters_the_fast_path() {
        let mut interpreter = MockInterpreterPort::new();
        interpreter.expect_interpret().returning(|_, _| {
            Ok(Interpretation::Action(
                ActionRequest::new(ActionName::Inventory),
            ))
        });
        let fx = fixture(interpreter);
        let user = UserId::new("alice");

        let outcome = fx
            .router
            .dispatch(
                fx.experience_id,
                &user,
                ClientMessage::Text {
                    text: "what am I carrying?".to_string(),
                },
            )
            .await;
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => {
                assert!(data.success);
                assert!(data.message.contains("carrying"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn narrative_interpretation_is_forwarded_verbatim() {
        let mut interpreter = MockInterpreterPort::new();
        interpreter
            .expect_interpret()
            .returning(|_, _| Ok(Interpretation::Narrative("The pier creaks.".to_string())));
        let fx = fixture(interpreter);
        let user = UserId::new("alice");

        let outcome = fx
            .router
            .dispatch(
                fx.experience_id,
                &user,
                ClientMessage::Text {
                    text: "look around".to_string(),
                },
            )
            .await;
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => {
                assert!(data.success);
                assert_eq!(data.message, "The pier creaks.");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn interpreter_failure_is_an_action_response_not_a_disconnect() {
        let mut interpreter = MockInterpreterPort::new();
        interpreter.expect_interpret().returning(|_, _| {
            Err(InterpreterError::RequestFailed("503".to_string()))
        });
        let fx = fixture(interpreter);
        let user = UserId::new("alice");

        let outcome = fx
            .router
            .dispatch(
                fx.experience_id,
                &user,
                ClientMessage::Text {
                    text: "do something".to_string(),
                },
            )
            .await;
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => assert!(!data.success),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_schema_lists_every_action() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        let outcome = fx
            .router
            .dispatch(fx.experience_id, &user, ClientMessage::CommandsSchema)
            .await;
        match &outcome.replies[0] {
            ServerMessage::CommandsSchema { commands } => {
                assert_eq!(commands.len(), COMMAND_SCHEMAS.len());
                assert!(commands.iter().any(|c| c.action == "collect_item"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_answers_with_pong_and_echoed_timestamp() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        let mut request = ActionRequest::new(ActionName::Ping);
        request.timestamp = Some(1_712_000_000);
        let outcome = fx
            .router
            .dispatch(fx.experience_id, &user, ClientMessage::Action(request))
            .await;
        match &outcome.replies[0] {
            ServerMessage::Pong {
                timestamp,
                server_time,
            } => {
                assert_eq!(*timestamp, Some(1_712_000_000));
                assert!(!server_time.is_empty());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gps_fix_far_from_any_zone_reports_no_zone() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        let mut request = ActionRequest::new(ActionName::UpdateLocation);
        request.gps = Some(waypoint_shared::GpsPayload {
            latitude: 0.0,
            longitude: 0.0,
            accuracy: None,
        });
        let outcome = fx
            .router
            .dispatch(fx.experience_id, &user, ClientMessage::Action(request))
            .await;
        assert_eq!(outcome.replies.len(), 1);
        match &outcome.replies[0] {
            ServerMessage::ActionResponse(data) => {
                assert!(data.success);
                assert!(data.message.contains("not near"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gps_fix_inside_a_zone_delivers_an_aoi_snapshot() {
        let fx = fixture(untouchable_interpreter());
        let user = UserId::new("alice");

        let mut request = ActionRequest::new(ActionName::UpdateLocation);
        request.gps = Some(waypoint_shared::GpsPayload {
            latitude: 52.0,
            longitude: 13.0,
            accuracy: Some(5.0),
        });
        let outcome = fx
            .router
            .dispatch(fx.experience_id, &user, ClientMessage::Action(request))
            .await;
        assert_eq!(outcome.replies.len(), 2);
        match &outcome.replies[1] {
            ServerMessage::AreaOfInterest(data) => {
                assert!((data.zone.gps.lat - 52.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
