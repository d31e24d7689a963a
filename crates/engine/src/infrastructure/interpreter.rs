//! HTTP client for the natural-language interpretation service.
//!
//! The service receives free text plus player/world context and answers
//! with either a structured action to re-dispatch or narrative text to
//! forward as-is. Latency is unbounded; the generous timeout reflects
//! that.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use waypoint_shared::ActionRequest;

use crate::infrastructure::ports::{
    Interpretation, InterpreterContext, InterpreterError, InterpreterPort,
};

/// Default interpretation service base URL.
pub const DEFAULT_INTERPRETER_BASE_URL: &str = "http://localhost:5005";

#[derive(Clone)]
pub struct HttpInterpreterClient {
    client: Client,
    base_url: String,
}

impl HttpInterpreterClient {
    pub fn new(base_url: &str) -> Self {
        // Interpretation can take many seconds; allow for a slow model.
        Self::with_timeout(base_url, 120)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct InterpretRequest<'a> {
    text: &'a str,
    context: &'a InterpreterContext,
}

#[derive(Deserialize)]
struct InterpretResponse {
    #[serde(default)]
    action: Option<ActionRequest>,
    #[serde(default)]
    narrative: Option<String>,
}

#[async_trait]
impl InterpreterPort for HttpInterpreterClient {
    async fn interpret(
        &self,
        text: &str,
        context: InterpreterContext,
    ) -> Result<Interpretation, InterpreterError> {
        let response = self
            .client
            .post(format!("{}/interpret", self.base_url))
            .json(&InterpretRequest {
                text,
                context: &context,
            })
            .send()
            .await
            .map_err(|e| InterpreterError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(InterpreterError::RequestFailed(format!(
                "{status}: {error_text}"
            )));
        }

        let body: InterpretResponse = response
            .json()
            .await
            .map_err(|e| InterpreterError::InvalidResponse(e.to_string()))?;

        match (body.action, body.narrative) {
            (Some(action), _) => Ok(Interpretation::Action(action)),
            (None, Some(narrative)) => Ok(Interpretation::Narrative(narrative)),
            (None, None) => Err(InterpreterError::InvalidResponse(
                "neither action nor narrative in response".to_string(),
            )),
        }
    }
}
