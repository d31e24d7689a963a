//! Connection management for WebSocket clients.
//!
//! Tracks live connections and the user each one speaks for. The
//! broadcaster and broker own message fan-out; this registry exists so
//! teardown can tell whether a user still has another session open.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use waypoint_domain::{ConnectionId, ExperienceId, UserId};
use waypoint_shared::ServerMessage;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub experience_id: ExperienceId,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        experience_id: ExperienceId,
        user_id: UserId,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let info = ConnectionInfo {
            connection_id,
            user_id,
            experience_id,
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    /// Get connection info by ID.
    pub async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections
            .get(&connection_id)
            .map(|(info, _)| info.clone())
    }

    /// How many live sessions a user has in an experience.
    pub async fn user_session_count(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|(info, _)| info.experience_id == experience_id && info.user_id == *user_id)
            .count()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
