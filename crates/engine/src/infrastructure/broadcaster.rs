//! Event broadcasting for committed world mutations.
//!
//! Every committed `WorldUpdate` is published once per registered
//! recipient on that recipient's own subject, stamped with the version
//! of the last full snapshot the recipient holds. The originator of a
//! mutation receives its own update through the same subject as
//! everyone else.

use dashmap::DashMap;

use waypoint_domain::{ExperienceId, UserId, WorldUpdate};
use waypoint_shared::ServerMessage;

use std::sync::Arc;

use crate::infrastructure::ports::BrokerPort;

/// Subject a user's session subscribes to.
pub fn user_subject(experience_id: ExperienceId, user_id: &UserId) -> String {
    format!("experience.{experience_id}.user.{user_id}")
}

pub struct EventBroadcaster {
    broker: Arc<dyn BrokerPort>,
    /// Last snapshot version sent to each registered recipient.
    snapshot_versions: DashMap<(ExperienceId, UserId), u64>,
}

impl EventBroadcaster {
    pub fn new(broker: Arc<dyn BrokerPort>) -> Self {
        Self {
            broker,
            snapshot_versions: DashMap::new(),
        }
    }

    /// Register a recipient. Called when a session connects.
    pub fn register(&self, experience_id: ExperienceId, user_id: &UserId) {
        self.snapshot_versions
            .entry((experience_id, user_id.clone()))
            .or_insert(0);
    }

    /// Forget a recipient. Called when its last session disconnects.
    pub fn unregister(&self, experience_id: ExperienceId, user_id: &UserId) {
        self.snapshot_versions
            .remove(&(experience_id, user_id.clone()));
    }

    /// Record that `user_id` was just sent a full snapshot at `version`.
    pub fn record_snapshot(&self, experience_id: ExperienceId, user_id: &UserId, version: u64) {
        self.snapshot_versions
            .insert((experience_id, user_id.clone()), version);
    }

    /// Publish a committed update to every registered recipient of the
    /// experience, each copy stamped with that recipient's snapshot
    /// baseline.
    pub async fn broadcast_update(&self, experience_id: ExperienceId, update: &WorldUpdate) {
        let recipients: Vec<(UserId, u64)> = self
            .snapshot_versions
            .iter()
            .filter(|entry| entry.key().0 == experience_id)
            .map(|entry| (entry.key().1.clone(), *entry.value()))
            .collect();

        for (user_id, snapshot_version) in recipients {
            let mut stamped = update.clone();
            stamped.snapshot_version = snapshot_version;
            let subject = user_subject(experience_id, &user_id);
            if let Err(e) = self
                .broker
                .publish(&subject, ServerMessage::WorldUpdate(stamped))
                .await
            {
                tracing::warn!(subject, error = %e, "Failed to publish world update");
            }
        }
    }

    /// Publish a message to one recipient's subject (quest progress,
    /// targeted notifications).
    pub async fn publish_to_user(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
        message: ServerMessage,
    ) {
        let subject = user_subject(experience_id, user_id);
        if let Err(e) = self.broker.publish(&subject, message).await {
            tracing::warn!(subject, error = %e, "Failed to publish message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broker::InProcessBroker;

    fn update(version: u64) -> WorldUpdate {
        WorldUpdate {
            version,
            base_version: version - 1,
            snapshot_version: 0,
            changes: vec![],
        }
    }

    #[tokio::test]
    async fn stamps_each_recipient_with_their_snapshot_version() {
        let broker = Arc::new(InProcessBroker::new());
        let broadcaster = EventBroadcaster::new(broker.clone());
        let experience = ExperienceId::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        broadcaster.register(experience, &alice);
        broadcaster.register(experience, &bob);
        broadcaster.record_snapshot(experience, &alice, 3);

        let (_, mut alice_rx) = broker
            .subscribe(&user_subject(experience, &alice))
            .await
            .expect("subscribes");
        let (_, mut bob_rx) = broker
            .subscribe(&user_subject(experience, &bob))
            .await
            .expect("subscribes");

        broadcaster.broadcast_update(experience, &update(4)).await;

        match alice_rx.recv().await {
            Some(ServerMessage::WorldUpdate(u)) => assert_eq!(u.snapshot_version, 3),
            other => panic!("unexpected: {other:?}"),
        }
        match bob_rx.recv().await {
            Some(ServerMessage::WorldUpdate(u)) => assert_eq!(u.snapshot_version, 0),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unregistered_users_receive_nothing() {
        let broker = Arc::new(InProcessBroker::new());
        let broadcaster = EventBroadcaster::new(broker.clone());
        let experience = ExperienceId::new();
        let alice = UserId::new("alice");

        broadcaster.register(experience, &alice);
        broadcaster.unregister(experience, &alice);

        let (_, mut rx) = broker
            .subscribe(&user_subject(experience, &alice))
            .await
            .expect("subscribes");
        broadcaster.broadcast_update(experience, &update(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
