//! Full-stack WebSocket session tests.
//!
//! Brings up the real server on an ephemeral port and drives it with a
//! tokio-tungstenite client: authenticated handshake, structured
//! commands, world-update delivery over the subscription, the slow
//! path, and the two-phase reset.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use waypoint_domain::{
    Area, BackupId, ExperienceId, GpsCoord, InstanceId, ItemInstance, Location, Spot, TemplateId,
    UserId, World, WorldTemplate,
};
use waypoint_engine::infrastructure::broadcaster::user_subject;
use waypoint_engine::infrastructure::broker::InProcessBroker;
use waypoint_engine::infrastructure::clock::SystemClock;
use waypoint_engine::infrastructure::ports::{
    AuthError, AuthPort, BrokerPort, ClockPort, Interpretation, InterpreterContext,
    InterpreterError, InterpreterPort, TemplateStoreError, TemplateStorePort,
};
use waypoint_engine::{api, App};
use waypoint_shared::{ActionName, ActionRequest, ClientMessage, ResetScope, ServerMessage};

// =============================================================================
// Collaborator stubs
// =============================================================================

/// Accepts any token of the form `token-<user>`.
struct StaticTokenAuth;

#[async_trait]
impl AuthPort for StaticTokenAuth {
    async fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix("token-") {
            Some(user) if !user.is_empty() => Ok(UserId::new(user)),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Counts invocations so tests can prove the fast path never came here.
#[derive(Default)]
struct CountingInterpreter {
    calls: AtomicUsize,
}

#[async_trait]
impl InterpreterPort for CountingInterpreter {
    async fn interpret(
        &self,
        _text: &str,
        _context: InterpreterContext,
    ) -> Result<Interpretation, InterpreterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Interpretation::Narrative("Nothing happens.".to_string()))
    }
}

#[derive(Default)]
struct InMemoryTemplates {
    templates: Mutex<HashMap<ExperienceId, WorldTemplate>>,
}

#[async_trait]
impl TemplateStorePort for InMemoryTemplates {
    async fn load_template(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<WorldTemplate>, TemplateStoreError> {
        Ok(self.templates.lock().await.get(&experience_id).cloned())
    }

    async fn save_template(&self, template: &WorldTemplate) -> Result<(), TemplateStoreError> {
        self.templates
            .lock()
            .await
            .insert(template.experience_id, template.clone());
        Ok(())
    }

    async fn save_backup(&self, _world: &World) -> Result<BackupId, TemplateStoreError> {
        Ok(BackupId::new())
    }
}

// =============================================================================
// Harness
// =============================================================================

struct TestServer {
    addr: std::net::SocketAddr,
    app: Arc<App>,
    interpreter: Arc<CountingInterpreter>,
    broker: Arc<InProcessBroker>,
    experience_id: ExperienceId,
    instance_id: InstanceId,
}

impl TestServer {
    fn ws_url(&self, token: &str) -> String {
        format!(
            "ws://{}/ws/experience?token={}&experience={}",
            self.addr, token, self.experience_id
        )
    }
}

async fn spawn_server() -> TestServer {
    let item = ItemInstance::new(TemplateId::new(), "spiral bottle");
    let instance_id = item.instance_id;
    let location = Location::new("Pier", "The old pier", GpsCoord::new(52.0, 13.0))
        .with_area(Area::new().with_spot(Spot::new().with_item(item)));
    let world = World::new("harbor").with_location(location);
    let experience_id = world.id;
    let template = WorldTemplate::from_world(&world);

    let interpreter = Arc::new(CountingInterpreter::default());
    let broker = Arc::new(InProcessBroker::new());
    let templates = Arc::new(InMemoryTemplates::default());
    templates.save_template(&template).await.expect("seeded");
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    let app = Arc::new(App::new(
        Arc::new(StaticTokenAuth),
        interpreter.clone(),
        broker.clone(),
        templates,
        clock,
    ));
    app.worlds.provision(world);

    let router = api::build_router(app.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("binds");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serves");
    });

    TestServer {
        addr,
        app,
        interpreter,
        broker,
        experience_id,
        instance_id,
    }
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer, token: &str) -> WsClient {
    let (client, _) = tokio_tungstenite::connect_async(server.ws_url(token))
        .await
        .expect("handshake");
    client
}

async fn send(client: &mut WsClient, message: &ClientMessage) {
    let json = serde_json::to_string(message).expect("serializes");
    client.send(Message::Text(json.into())).await.expect("sends");
}

/// Next JSON server message, skipping transport frames.
async fn recv(client: &mut WsClient) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("frame ok");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("parses");
        }
    }
}

/// Collect the next `want` server messages in arrival order.
async fn recv_n(client: &mut WsClient, want: usize) -> Vec<ServerMessage> {
    let mut messages = Vec::with_capacity(want);
    for _ in 0..want {
        messages.push(recv(client).await);
    }
    messages
}

async fn wait_for_zero_subscribers(server: &TestServer, subject: &str) {
    for _ in 0..50 {
        if server.broker.subscriber_count(subject).await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("subscription was not torn down");
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn unauthenticated_connection_is_rejected_before_handshake() {
    let server = spawn_server().await;
    let result = tokio_tungstenite::connect_async(server.ws_url("not-a-valid-token")).await;
    assert!(result.is_err(), "handshake must fail");
}

#[tokio::test]
async fn session_lifecycle_commands_and_broadcasts() {
    let server = spawn_server().await;
    let subject = user_subject(server.experience_id, &UserId::new("alice"));
    let mut client = connect(&server, "token-alice").await;

    // Handshake acknowledgement comes first.
    match recv(&mut client).await {
        ServerMessage::Connected { user_id, .. } => assert_eq!(user_id, "alice"),
        other => panic!("unexpected first message: {other:?}"),
    }
    assert_eq!(server.broker.subscriber_count(&subject).await, 1);

    // Navigate: action response plus an AOI snapshot.
    send(
        &mut client,
        &ClientMessage::Action(ActionRequest::new(ActionName::Go).with_destination("Pier")),
    )
    .await;
    let replies = recv_n(&mut client, 2).await;
    assert!(replies.iter().any(
        |m| matches!(m, ServerMessage::ActionResponse(data) if data.success)
    ));
    let aoi = replies
        .iter()
        .find_map(|m| match m {
            ServerMessage::AreaOfInterest(data) => Some(data),
            _ => None,
        })
        .expect("aoi delivered");
    assert_eq!(aoi.zone.name, "Pier");
    assert!((aoi.zone.gps.lat - 52.0).abs() < f64::EPSILON);

    // Collect: one action response and one broadcast world update, in
    // either order.
    send(
        &mut client,
        &ClientMessage::Action(
            ActionRequest::new(ActionName::CollectItem)
                .with_instance(server.instance_id.to_string()),
        ),
    )
    .await;
    let replies = recv_n(&mut client, 2).await;
    let response = replies
        .iter()
        .find_map(|m| match m {
            ServerMessage::ActionResponse(data) => Some(data),
            _ => None,
        })
        .expect("action response delivered");
    assert!(response.success);
    let update = replies
        .iter()
        .find_map(|m| match m {
            ServerMessage::WorldUpdate(update) => Some(update),
            _ => None,
        })
        .expect("world update delivered");
    assert_eq!(update.version, 1);
    assert_eq!(update.base_version, 0);
    assert_eq!(update.snapshot_version, aoi.snapshot_version);

    // The fast path never touched the interpreter.
    assert_eq!(server.interpreter.calls.load(Ordering::SeqCst), 0);

    // Free text always does.
    send(
        &mut client,
        &ClientMessage::Text {
            text: "wave at the seagulls".to_string(),
        },
    )
    .await;
    match recv(&mut client).await {
        ServerMessage::ActionResponse(data) => {
            assert!(data.success);
            assert_eq!(data.message, "Nothing happens.");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(server.interpreter.calls.load(Ordering::SeqCst), 1);

    // Malformed JSON gets an error message; the connection survives.
    client
        .send(Message::Text("{not json".to_string().into()))
        .await
        .expect("sends");
    match recv(&mut client).await {
        ServerMessage::Error { .. } => {}
        other => panic!("unexpected reply: {other:?}"),
    }
    send(
        &mut client,
        &ClientMessage::Action(ActionRequest::new(ActionName::Ping)),
    )
    .await;
    assert!(matches!(recv(&mut client).await, ServerMessage::Pong { .. }));

    // Disconnect tears the subscription down.
    client.close(None).await.expect("closes");
    wait_for_zero_subscribers(&server, &subject).await;
}

#[tokio::test]
async fn two_phase_reset_over_the_wire() {
    let server = spawn_server().await;
    let mut client = connect(&server, "token-alice").await;
    let _ = recv(&mut client).await; // connected

    // Mutate the world so there is something to reset.
    send(
        &mut client,
        &ClientMessage::Action(ActionRequest::new(ActionName::Go).with_destination("Pier")),
    )
    .await;
    let _ = recv_n(&mut client, 2).await;
    send(
        &mut client,
        &ClientMessage::Action(
            ActionRequest::new(ActionName::CollectItem)
                .with_instance(server.instance_id.to_string()),
        ),
    )
    .await;
    let _ = recv_n(&mut client, 2).await;

    // Preview: nothing changes, a confirm token comes back.
    send(
        &mut client,
        &ClientMessage::PreviewReset {
            scope: ResetScope::Experience,
        },
    )
    .await;
    let confirm_token = match recv(&mut client).await {
        ServerMessage::ActionResponse(data) => {
            assert!(data.success);
            data.metadata
                .as_ref()
                .and_then(|m| m["confirm_token"].as_str())
                .expect("token in metadata")
                .to_string()
        }
        other => panic!("unexpected reply: {other:?}"),
    };
    let snapshot = server
        .app
        .worlds
        .snapshot(server.experience_id)
        .await
        .expect("snapshot");
    assert_eq!(snapshot.version, 1, "preview must not mutate");
    assert_eq!(
        server.app.players.count_for_experience(server.experience_id),
        1
    );

    // Execute: template restored, views gone.
    send(
        &mut client,
        &ClientMessage::ExecuteReset {
            scope: ResetScope::Experience,
            confirm_token,
        },
    )
    .await;
    match recv(&mut client).await {
        ServerMessage::ActionResponse(data) => {
            assert!(data.success);
            let metadata = data.metadata.as_ref().expect("metadata");
            assert_eq!(metadata["reset_type"], "experience");
            assert_eq!(metadata["world_restored"], true);
            assert_eq!(metadata["player_views_deleted"], 1);
            assert!(metadata["backup_created"].is_string());
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    let restored = server
        .app
        .worlds
        .snapshot(server.experience_id)
        .await
        .expect("snapshot");
    assert_eq!(restored.version, 0);
    assert!(restored.find_item(server.instance_id).is_some());
    assert_eq!(
        server.app.players.count_for_experience(server.experience_id),
        0
    );
}
