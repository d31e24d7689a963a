//! External collaborator port traits (auth, interpretation, broker,
//! template store).

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use waypoint_domain::{BackupId, ExperienceId, UserId, World, WorldTemplate};
use waypoint_shared::{ActionRequest, ServerMessage};

use super::error::{AuthError, BrokerError, InterpreterError, TemplateStoreError};

// =============================================================================
// Authentication
// =============================================================================

/// Validates bearer tokens. The engine trusts the returned user id as
/// given; issuing tokens is the collaborator's business.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthPort: Send + Sync {
    async fn validate(&self, token: &str) -> Result<UserId, AuthError>;
}

// =============================================================================
// Natural-language interpretation
// =============================================================================

/// Player/world context shipped with a free-text command so the
/// interpretation collaborator can ground its answer.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InterpreterContext {
    pub user_id: String,
    pub location_name: Option<String>,
    pub inventory: Vec<String>,
    pub visible_items: Vec<String>,
    pub npcs_present: Vec<String>,
}

/// What the interpretation collaborator made of the text.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// A structured action to re-dispatch through the fast path.
    Action(ActionRequest),
    /// Narrative text to forward to the player as-is.
    Narrative(String),
}

/// The slow path: free text in, structured action or narrative out.
/// Calls are unbounded in latency and may be abandoned on disconnect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterpreterPort: Send + Sync {
    async fn interpret(
        &self,
        text: &str,
        context: InterpreterContext,
    ) -> Result<Interpretation, InterpreterError>;
}

// =============================================================================
// Pub/sub broker
// =============================================================================

/// Identifies one subscription on one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Message broker seam between committed mutations and live sessions.
///
/// Delivery is at-least-once; receivers apply idempotently keyed by
/// version. `subscriber_count` is the observable sessions are tested
/// against: a connected session holds exactly one subscription, a
/// disconnected one holds zero.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Publish to a subject; returns the number of receivers reached.
    async fn publish(&self, subject: &str, message: ServerMessage) -> Result<usize, BrokerError>;

    async fn subscribe(
        &self,
        subject: &str,
    ) -> Result<(SubscriptionId, mpsc::Receiver<ServerMessage>), BrokerError>;

    async fn unsubscribe(&self, subject: &str, id: SubscriptionId);

    async fn subscriber_count(&self, subject: &str) -> usize;
}

// =============================================================================
// Template / backup persistence
// =============================================================================

/// Authoritative world templates plus the backups reset takes before
/// restoring.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateStorePort: Send + Sync {
    async fn load_template(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<WorldTemplate>, TemplateStoreError>;

    async fn save_template(&self, template: &WorldTemplate) -> Result<(), TemplateStoreError>;

    /// Persist a pre-reset copy of the world; returns the backup id
    /// reported in reset metadata.
    async fn save_backup(&self, world: &World) -> Result<BackupId, TemplateStoreError>;
}
