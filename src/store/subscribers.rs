//! Subscriber repository over the `users` collection.

use std::sync::Arc;

use super::DocumentStore;
use crate::domain::Subscriber;
use crate::error::NotifierError;

/// Collection holding subscriber records.
pub const USERS_COLLECTION: &str = "users";

/// Read/write access to subscribers.
///
/// Every mutation is a single read-modify-write under the store lock, so
/// concurrent chat commands for the same user cannot lose updates.
#[derive(Debug, Clone)]
pub struct SubscriberRepository {
    store: Arc<DocumentStore>,
}

impl SubscriberRepository {
    /// Creates a repository backed by `store`.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns every subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<Subscriber>, NotifierError> {
        self.store.load(USERS_COLLECTION).await
    }

    /// Returns the subscriber with `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the collection cannot be read.
    pub async fn get(&self, user_id: i64) -> Result<Option<Subscriber>, NotifierError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| u.user_id == user_id))
    }

    /// Inserts `subscriber`, replacing any record with the same user id.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on read or write failure.
    pub async fn upsert(&self, subscriber: Subscriber) -> Result<(), NotifierError> {
        self.store
            .update(USERS_COLLECTION, |users: &mut Vec<Subscriber>| {
                users.retain(|u| u.user_id != subscriber.user_id);
                users.push(subscriber);
            })
            .await
    }

    /// Creates the subscriber on first contact, or re-enables an existing
    /// one and refreshes its destination. Filters and locale are kept.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on read or write failure.
    pub async fn register(
        &self,
        user_id: i64,
        destination: &str,
    ) -> Result<Subscriber, NotifierError> {
        let subscriber = self
            .store
            .update(USERS_COLLECTION, |users: &mut Vec<Subscriber>| {
                if let Some(existing) = users.iter_mut().find(|u| u.user_id == user_id) {
                    existing.destination = destination.to_string();
                    existing.notifications_enabled = true;
                    existing.clone()
                } else {
                    let created = Subscriber::new(user_id, destination);
                    users.push(created.clone());
                    created
                }
            })
            .await?;
        tracing::info!(user_id, "subscriber registered");
        Ok(subscriber)
    }

    /// Turns notifications on or off.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::SubscriberNotFound`] for an unknown user and
    /// [`NotifierError::Store`] on read or write failure.
    pub async fn set_enabled(&self, user_id: i64, enabled: bool) -> Result<(), NotifierError> {
        self.modify(user_id, |sub| {
            sub.notifications_enabled = enabled;
        })
        .await?;
        tracing::info!(user_id, enabled, "subscriber notifications toggled");
        Ok(())
    }

    /// Adds a reward filter. Returns `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::SubscriberNotFound`] for an unknown user and
    /// [`NotifierError::Store`] on read or write failure.
    pub async fn add_filter(&self, user_id: i64, filter: &str) -> Result<bool, NotifierError> {
        self.modify(user_id, |sub| sub.add_filter(filter)).await
    }

    /// Removes a reward filter. Returns `false` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::SubscriberNotFound`] for an unknown user and
    /// [`NotifierError::Store`] on read or write failure.
    pub async fn remove_filter(&self, user_id: i64, filter: &str) -> Result<bool, NotifierError> {
        self.modify(user_id, |sub| sub.remove_filter(filter)).await
    }

    async fn modify<R>(
        &self,
        user_id: i64,
        change: impl FnOnce(&mut Subscriber) -> R,
    ) -> Result<R, NotifierError> {
        self.store
            .update(USERS_COLLECTION, |users: &mut Vec<Subscriber>| {
                users
                    .iter_mut()
                    .find(|u| u.user_id == user_id)
                    .map(change)
            })
            .await?
            .ok_or(NotifierError::SubscriberNotFound(user_id))
    }
}
