//! WebSocket message envelopes.
//!
//! Both sides exchange internally-tagged JSON: every frame carries a
//! `type` field naming the variant. Unknown `type` values fail to parse
//! and are answered with an `error` message; the connection stays open.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing or renaming variants is a breaking change

use serde::{Deserialize, Serialize};

use waypoint_domain::WorldUpdate;

use crate::commands::ActionRequest;
use crate::responses::{
    ActionResponseData, AreaOfInterestData, CommandSchemaData, ErrorCode, QuestUpdateData,
    ResetScope,
};

// =============================================================================
// Client Messages (client → Engine)
// =============================================================================

/// Messages from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A structured fast-path action:
    /// `{"type":"action","action":"collect_item","instance_id":"..."}`
    Action(ActionRequest),
    /// Free text, delegated to the interpretation collaborator.
    Text { text: String },
    /// Ask for the structured-command schema table.
    CommandsSchema,
    /// First phase of a reset: describe what would happen, mutate nothing.
    PreviewReset {
        #[serde(flatten)]
        scope: ResetScope,
    },
    /// Second phase: execute, authorized by the token preview returned.
    ExecuteReset {
        #[serde(flatten)]
        scope: ResetScope,
        confirm_token: String,
    },
}

// =============================================================================
// Server Messages (Engine → client)
// =============================================================================

/// Messages from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake acknowledgement, first message on every connection.
    Connected {
        connection_id: String,
        user_id: String,
    },
    /// The one reply every command gets.
    ActionResponse(ActionResponseData),
    /// Versioned world delta.
    WorldUpdate(WorldUpdate),
    /// Quest progress changed.
    QuestUpdate(QuestUpdateData),
    /// Terminal completion event, emitted once per quest in addition to
    /// the final `quest_update`.
    QuestComplete(QuestUpdateData),
    /// Filtered snapshot of the player's surroundings.
    AreaOfInterest(AreaOfInterestData),
    /// Liveness reply.
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
        server_time: String,
    },
    /// The introspectable command table.
    CommandsSchema { commands: Vec<CommandSchemaData> },
    /// Transport- or protocol-level failure.
    Error { code: ErrorCode, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ActionName;

    #[test]
    fn action_envelope_matches_wire_shape() {
        let json = r#"{"type":"action","action":"collect_item","instance_id":"i-42"}"#;
        let msg: ClientMessage = serde_json::from_str(json).expect("parses");
        match msg {
            ClientMessage::Action(request) => {
                assert_eq!(request.action, ActionName::CollectItem);
                assert_eq!(request.instance_id.as_deref(), Some("i-42"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_fails_to_parse() {
        let json = r#"{"type":"action","action":"teleport"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn reset_scope_flattens_into_envelope() {
        let json = r#"{"type":"preview_reset","scope":"player","user_id":"u-7"}"#;
        let msg: ClientMessage = serde_json::from_str(json).expect("parses");
        assert_eq!(
            msg,
            ClientMessage::PreviewReset {
                scope: ResetScope::Player {
                    user_id: "u-7".to_string()
                }
            }
        );
    }

    #[test]
    fn server_messages_tag_with_snake_case_type() {
        let msg = ServerMessage::Connected {
            connection_id: "c-1".to_string(),
            user_id: "u-1".to_string(),
        };
        let value = serde_json::to_value(&msg).expect("serializes");
        assert_eq!(value["type"], "connected");

        let msg = ServerMessage::ActionResponse(ActionResponseData::ok("done"));
        let value = serde_json::to_value(&msg).expect("serializes");
        assert_eq!(value["type"], "action_response");
        assert_eq!(value["success"], true);
    }

    #[test]
    fn world_update_envelope_carries_versions_inline() {
        let update = WorldUpdate {
            version: 3,
            base_version: 2,
            snapshot_version: 1,
            changes: vec![],
        };
        let value = serde_json::to_value(ServerMessage::WorldUpdate(update)).expect("serializes");
        assert_eq!(value["type"], "world_update");
        assert_eq!(value["version"], 3);
        assert_eq!(value["base_version"], 2);
        assert_eq!(value["snapshot_version"], 1);
    }
}
