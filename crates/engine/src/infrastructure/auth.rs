//! HTTP client for the authentication collaborator.
//!
//! The engine never inspects tokens itself: it forwards the bearer
//! token and trusts the returned user id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use waypoint_domain::UserId;

use crate::infrastructure::ports::{AuthError, AuthPort};

/// Default auth service base URL.
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:4000";

#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ValidateResponse {
    user_id: String,
}

#[async_trait]
impl AuthPort for HttpAuthClient {
    async fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        let response = self
            .client
            .get(format!("{}/validate", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthError::InvalidToken);
        }
        if !response.status().is_success() {
            return Err(AuthError::Unavailable(format!(
                "auth service returned {}",
                response.status()
            )));
        }

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        Ok(UserId::new(body.user_id))
    }
}
