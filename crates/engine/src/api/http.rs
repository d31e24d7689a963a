//! HTTP routes.
//!
//! The HTTP surface is a stateless fallback for clients that cannot
//! hold a WebSocket: one command in, the command's replies out. No
//! subscription exists, so world updates provoked by other players are
//! only visible through a fresh AOI request.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use waypoint_domain::ExperienceId;
use waypoint_shared::{ClientMessage, ServerMessage};

use crate::app::App;
use crate::infrastructure::ports::{AuthError, AuthPort};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/experience/interact", post(interact))
        // Legacy chat alias; wraps free text into the same pipeline.
        .route("/api/v1/experience/chat", post(legacy_chat))
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct InteractRequest {
    experience_id: Uuid,
    #[serde(flatten)]
    command: ClientMessage,
}

/// Replies in dispatch order; the action response (or pong) leads.
#[derive(Debug, Serialize)]
struct InteractResponse {
    messages: Vec<ServerMessage>,
}

async fn interact(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(request): Json<InteractRequest>,
) -> Result<Json<InteractResponse>, ApiError> {
    let user_id = authenticate(&app, &headers).await?;
    let experience_id = ExperienceId::from_uuid(request.experience_id);
    if !app.worlds.contains(experience_id) {
        return Err(ApiError::NotFound);
    }

    let outcome = app
        .router
        .dispatch(experience_id, &user_id, request.command)
        .await;
    Ok(Json(InteractResponse {
        messages: outcome.replies,
    }))
}

#[derive(Debug, Deserialize)]
struct LegacyChatRequest {
    experience_id: Uuid,
    message: String,
}

async fn legacy_chat(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(request): Json<LegacyChatRequest>,
) -> Result<Json<InteractResponse>, ApiError> {
    let user_id = authenticate(&app, &headers).await?;
    let experience_id = ExperienceId::from_uuid(request.experience_id);
    if !app.worlds.contains(experience_id) {
        return Err(ApiError::NotFound);
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let outcome = app
        .router
        .dispatch(
            experience_id,
            &user_id,
            ClientMessage::Text {
                text: request.message,
            },
        )
        .await;
    Ok(Json(InteractResponse {
        messages: outcome.replies,
    }))
}

async fn authenticate(
    app: &App,
    headers: &HeaderMap,
) -> Result<waypoint_domain::UserId, ApiError> {
    let token = bearer_token(headers)?;
    app.auth.validate(token).await.map_err(|e| match e {
        AuthError::InvalidToken => ApiError::Unauthorized,
        AuthError::Unavailable(message) => ApiError::Internal(message),
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().expect("valid"));
        assert_eq!(bearer_token(&headers).expect("token"), "abc123");

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "abc123".parse().expect("valid"));
        assert!(bearer_token(&headers).is_err());

        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn interact_request_flattens_the_command_envelope() {
        let json = format!(
            r#"{{"experience_id":"{}","type":"action","action":"inventory"}}"#,
            Uuid::new_v4()
        );
        let request: InteractRequest = serde_json::from_str(&json).expect("parses");
        assert!(matches!(request.command, ClientMessage::Action(_)));
    }
}
