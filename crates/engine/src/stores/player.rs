//! Per-player view storage.
//!
//! Views are created lazily on first interaction and serialized per
//! user: each view sits behind its own mutex, so two commands from the
//! same user cannot interleave, while different users never contend.
//! Deleting a view never touches world state.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use waypoint_domain::{ExperienceId, InstanceId, PlayerView, UserId};

pub struct PlayerViewStore {
    views: DashMap<(ExperienceId, UserId), Arc<Mutex<PlayerView>>>,
}

impl PlayerViewStore {
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
        }
    }

    /// The view for a user, created on first touch.
    pub fn get_or_create(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> Arc<Mutex<PlayerView>> {
        self.views
            .entry((experience_id, user_id.clone()))
            .or_insert_with(|| {
                tracing::debug!(user_id = %user_id, experience_id = %experience_id, "Player view created");
                Arc::new(Mutex::new(PlayerView::new(user_id.clone(), experience_id)))
            })
            .clone()
    }

    pub async fn snapshot(
        &self,
        experience_id: ExperienceId,
        user_id: &UserId,
    ) -> Option<PlayerView> {
        let view = self
            .views
            .get(&(experience_id, user_id.clone()))?
            .clone();
        let view = view.lock().await;
        Some(view.clone())
    }

    /// Delete one player's view. Returns whether it existed.
    pub fn delete(&self, experience_id: ExperienceId, user_id: &UserId) -> bool {
        self.views
            .remove(&(experience_id, user_id.clone()))
            .is_some()
    }

    /// Delete every view belonging to an experience; returns the count.
    pub fn delete_for_experience(&self, experience_id: ExperienceId) -> usize {
        let keys: Vec<_> = self
            .views
            .iter()
            .filter(|entry| entry.key().0 == experience_id)
            .map(|entry| entry.key().clone())
            .collect();
        let mut deleted = 0;
        for key in keys {
            if self.views.remove(&key).is_some() {
                deleted += 1;
            }
        }
        deleted
    }

    pub fn count_for_experience(&self, experience_id: ExperienceId) -> usize {
        self.views
            .iter()
            .filter(|entry| entry.key().0 == experience_id)
            .count()
    }

    /// Remove an item instance from whichever inventory holds it.
    /// Used by instance-scoped reset so a restore cannot duplicate.
    pub async fn remove_instance_everywhere(
        &self,
        experience_id: ExperienceId,
        instance_id: InstanceId,
    ) -> bool {
        let views: Vec<_> = self
            .views
            .iter()
            .filter(|entry| entry.key().0 == experience_id)
            .map(|entry| entry.value().clone())
            .collect();

        for view in views {
            let mut view = view.lock().await;
            if view.take_from_inventory(instance_id).is_ok() {
                return true;
            }
        }
        false
    }
}

impl Default for PlayerViewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_domain::{ItemInstance, TemplateId};

    #[tokio::test]
    async fn views_are_created_lazily_and_deleted_independently() {
        let store = PlayerViewStore::new();
        let experience = ExperienceId::new();
        let alice = UserId::new("alice");

        assert!(store.snapshot(experience, &alice).await.is_none());

        let view = store.get_or_create(experience, &alice);
        view.lock().await.add_to_inventory(ItemInstance::new(
            TemplateId::new(),
            "brass key",
        ));

        assert_eq!(store.count_for_experience(experience), 1);
        assert!(store.delete(experience, &alice));
        assert!(store.snapshot(experience, &alice).await.is_none());
    }

    #[tokio::test]
    async fn delete_for_experience_only_affects_that_experience() {
        let store = PlayerViewStore::new();
        let exp_a = ExperienceId::new();
        let exp_b = ExperienceId::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        store.get_or_create(exp_a, &alice);
        store.get_or_create(exp_a, &bob);
        store.get_or_create(exp_b, &alice);

        assert_eq!(store.delete_for_experience(exp_a), 2);
        assert_eq!(store.count_for_experience(exp_a), 0);
        assert_eq!(store.count_for_experience(exp_b), 1);
    }

    #[tokio::test]
    async fn remove_instance_everywhere_finds_the_holder() {
        let store = PlayerViewStore::new();
        let experience = ExperienceId::new();
        let alice = UserId::new("alice");
        let item = ItemInstance::new(TemplateId::new(), "spiral bottle");
        let instance_id = item.instance_id;

        store
            .get_or_create(experience, &alice)
            .lock()
            .await
            .add_to_inventory(item);

        assert!(store.remove_instance_everywhere(experience, instance_id).await);
        assert!(!store.remove_instance_everywhere(experience, instance_id).await);
    }
}
