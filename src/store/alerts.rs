//! Legacy alert list and per-user completion records.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::DocumentStore;
use crate::domain::{CompletedAlert, LegacyAlert};
use crate::error::NotifierError;

/// Collection holding the legacy alert list.
pub const ALERTS_COLLECTION: &str = "alerts";

/// Collection holding completion records.
pub const COMPLETED_COLLECTION: &str = "completed";

/// Access to legacy alerts and completion tracking.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    store: Arc<DocumentStore>,
}

impl AlertRepository {
    /// Creates a repository backed by `store`.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Replaces the stored alert list.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on write failure.
    pub async fn save_alerts(&self, alerts: &[LegacyAlert]) -> Result<(), NotifierError> {
        self.store.save(ALERTS_COLLECTION, alerts).await
    }

    /// Alerts that are active and have not ended at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on read failure.
    pub async fn active_alerts(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<LegacyAlert>, NotifierError> {
        let alerts: Vec<LegacyAlert> = self.store.load(ALERTS_COLLECTION).await?;
        Ok(alerts.into_iter().filter(|a| a.is_live_at(now)).collect())
    }

    /// Records that `user_id` completed `alert_id` unless a record already
    /// exists. The check and the append share one store update, so
    /// concurrent requests never write duplicates. Returns whether a record
    /// was added.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::InvalidRequest`] if `alert_id` is blank,
    /// contains whitespace or exceeds [`MAX_ALERT_ID_LEN`] bytes, and
    /// [`NotifierError::Store`] on read or write failure.
    pub async fn mark_completed_once(
        &self,
        alert_id: &str,
        user_id: i64,
    ) -> Result<bool, NotifierError> {
        validate_alert_id(alert_id)?;
        let added = self
            .store
            .update(COMPLETED_COLLECTION, |completed: &mut Vec<CompletedAlert>| {
                if completed
                    .iter()
                    .any(|c| c.alert_id == alert_id && c.user_id == user_id)
                {
                    return false;
                }
                completed.push(CompletedAlert {
                    alert_id: alert_id.to_string(),
                    user_id,
                    completed_at: Utc::now(),
                });
                true
            })
            .await?;
        if added {
            tracing::info!(alert_id, user_id, "alert marked completed");
        }
        Ok(added)
    }

    /// Whether `user_id` has completed `alert_id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on read failure.
    pub async fn is_completed(&self, alert_id: &str, user_id: i64) -> Result<bool, NotifierError> {
        let completed: Vec<CompletedAlert> = self.store.load(COMPLETED_COLLECTION).await?;
        Ok(completed
            .iter()
            .any(|c| c.alert_id == alert_id && c.user_id == user_id))
    }

    /// Stored alerts that `user_id` has completed, in alert-list order.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] on read failure.
    pub async fn completed_alerts(&self, user_id: i64) -> Result<Vec<LegacyAlert>, NotifierError> {
        let completed: Vec<CompletedAlert> = self.store.load(COMPLETED_COLLECTION).await?;
        let ids: HashSet<String> = completed
            .into_iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.alert_id)
            .collect();
        let alerts: Vec<LegacyAlert> = self.store.load(ALERTS_COLLECTION).await?;
        Ok(alerts.into_iter().filter(|a| ids.contains(&a.id)).collect())
    }
}

/// Longest alert id accepted from users.
pub const MAX_ALERT_ID_LEN: usize = 64;

fn validate_alert_id(alert_id: &str) -> Result<(), NotifierError> {
    if alert_id.is_empty()
        || alert_id.len() > MAX_ALERT_ID_LEN
        || alert_id.chars().any(char::is_whitespace)
    {
        return Err(NotifierError::InvalidRequest(format!(
            "alert id must be a single word of at most {MAX_ALERT_ID_LEN} characters"
        )));
    }
    Ok(())
}
