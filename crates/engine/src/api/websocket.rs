//! WebSocket session handling.
//!
//! One task per connection reads commands; a second forwards outbound
//! traffic, merging direct replies with the user's broker subscription.
//! The bearer token is validated before the upgrade completes, so an
//! unauthenticated attempt never becomes a WebSocket at all.
//!
//! Malformed JSON is answered with an `error` message and the
//! connection stays open; only transport failures end the session.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use waypoint_domain::{ConnectionId, ExperienceId, UserId};
use waypoint_shared::{ClientMessage, ErrorCode, ServerMessage};

use crate::app::App;
use crate::infrastructure::broadcaster::user_subject;
use crate::infrastructure::ports::{AuthError, AuthPort, BrokerPort};

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    token: String,
    experience: Uuid,
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(app): State<Arc<App>>,
) -> Response {
    let user_id = match app.auth.validate(&params.token).await {
        Ok(user_id) => user_id,
        Err(AuthError::InvalidToken) => {
            tracing::debug!("Rejected connection attempt with invalid token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth service failure during handshake");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let experience_id = ExperienceId::from_uuid(params.experience);
    if !app.worlds.contains(experience_id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, app, experience_id, user_id))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(
    socket: WebSocket,
    app: Arc<App>,
    experience_id: ExperienceId,
    user_id: UserId,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    app.connections
        .register(connection_id, experience_id, user_id.clone(), tx.clone())
        .await;
    app.broadcaster.register(experience_id, &user_id);

    let subject = user_subject(experience_id, &user_id);
    let subscription = match app.broker.subscribe(&subject).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Broker subscription failed");
            app.connections.unregister(connection_id).await;
            return;
        }
    };
    let (subscription_id, mut sub_rx) = subscription;

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    let _ = tx.try_send(ServerMessage::Connected {
        connection_id: connection_id.to_string(),
        user_id: user_id.to_string(),
    });

    // Forward direct replies and broadcast deliveries to the socket.
    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                direct = rx.recv() => direct,
                broadcast = sub_rx.recv() => broadcast,
            };
            let Some(message) = message else { break };
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                }
            }
        }
    });

    // Inbound command loop. Dispatch runs inline so a user's commands
    // on one connection process in order.
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => {
                    let outcome = app.router.dispatch(experience_id, &user_id, message).await;
                    for reply in outcome.replies {
                        if tx.try_send(reply).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send reply, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    let _ = tx.try_send(ServerMessage::Error {
                        code: ErrorCode::ParseError,
                        message: format!("Invalid message format: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Teardown: the subscription goes first so a disconnected session
    // observably holds zero subscriptions.
    app.broker.unsubscribe(&subject, subscription_id).await;
    app.connections.unregister(connection_id).await;
    if app
        .connections
        .user_session_count(experience_id, &user_id)
        .await
        == 0
    {
        app.broadcaster.unregister(experience_id, &user_id);
    }
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}
