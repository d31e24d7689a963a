//! In-process pub/sub broker.
//!
//! One bounded channel per subscriber, keyed by subject. This is the
//! default `BrokerPort` implementation; an external broker slots in
//! behind the same trait without touching session code.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use waypoint_shared::ServerMessage;

use crate::infrastructure::ports::{BrokerError, BrokerPort, SubscriptionId};

/// Buffer size per subscription channel.
const SUBSCRIPTION_CHANNEL_BUFFER: usize = 256;

pub struct InProcessBroker {
    subjects: DashMap<String, HashMap<SubscriptionId, mpsc::Sender<ServerMessage>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self {
            subjects: DashMap::new(),
        }
    }
}

impl Default for InProcessBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerPort for InProcessBroker {
    async fn publish(&self, subject: &str, message: ServerMessage) -> Result<usize, BrokerError> {
        let mut delivered = 0;
        if let Some(mut entry) = self.subjects.get_mut(subject) {
            // Drop subscribers whose receiver side is gone.
            entry.retain(|id, sender| {
                if sender.is_closed() {
                    tracing::debug!(subject, subscription_id = ?id, "Pruning closed subscription");
                    return false;
                }
                match sender.try_send(message.clone()) {
                    Ok(()) => {
                        delivered += 1;
                        true
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(subject, subscription_id = ?id, "Subscriber channel full, dropping message");
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                }
            });
        }
        Ok(delivered)
    }

    async fn subscribe(
        &self,
        subject: &str,
    ) -> Result<(SubscriptionId, mpsc::Receiver<ServerMessage>), BrokerError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CHANNEL_BUFFER);
        let id = SubscriptionId::new();
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .insert(id, tx);
        tracing::debug!(subject, subscription_id = ?id, "Subscription created");
        Ok((id, rx))
    }

    async fn unsubscribe(&self, subject: &str, id: SubscriptionId) {
        let mut remove_subject = false;
        if let Some(mut entry) = self.subjects.get_mut(subject) {
            if entry.remove(&id).is_some() {
                tracing::debug!(subject, subscription_id = ?id, "Subscription removed");
            }
            remove_subject = entry.is_empty();
        }
        if remove_subject {
            self.subjects
                .remove_if(subject, |_, senders| senders.is_empty());
        }
    }

    async fn subscriber_count(&self, subject: &str) -> usize {
        self.subjects
            .get(subject)
            .map(|senders| senders.values().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}
