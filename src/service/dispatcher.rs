//! Per-subscriber filtering and delivery of a cycle's notices.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use utoipa::ToSchema;

use super::render;
use crate::chat::ChatTransport;
use crate::domain::{Delta, Notice, Subscriber};
use crate::error::NotifierError;
use crate::store::SubscriberRepository;

/// Delivery counts for one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchReport {
    /// Enabled subscribers considered.
    pub subscribers: usize,
    /// Messages sent successfully.
    pub delivered: usize,
    /// Messages whose send failed.
    pub failed: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: Self) {
        self.subscribers += other.subscribers;
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Sends each enabled subscriber the notices that pass their filters.
///
/// Subscribers are served concurrently. Within one subscriber, notices go
/// out in delta order and a failed send does not skip the rest.
#[derive(Debug)]
pub struct Dispatcher<C> {
    chat: Arc<C>,
    subscribers: SubscriberRepository,
}

impl<C: ChatTransport> Dispatcher<C> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(chat: Arc<C>, subscribers: SubscriberRepository) -> Self {
        Self { chat, subscribers }
    }

    /// Delivers `delta`, reading the subscriber list fresh from the store.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Store`] if the subscriber list cannot be
    /// read. Send failures are counted, not returned.
    pub async fn dispatch(&self, delta: &Delta) -> Result<DispatchReport, NotifierError> {
        if delta.is_empty() {
            return Ok(DispatchReport::default());
        }

        let subscribers = self.subscribers.list().await?;
        let messages: Vec<(&Notice, String)> = delta
            .notices()
            .iter()
            .map(|notice| (notice, render::notice(notice)))
            .collect();

        let deliveries = subscribers
            .iter()
            .filter(|s| s.notifications_enabled)
            .map(|subscriber| self.deliver(subscriber, &messages));

        let mut report = DispatchReport::default();
        for outcome in join_all(deliveries).await {
            report.absorb(outcome);
        }

        tracing::info!(
            notices = delta.len(),
            subscribers = report.subscribers,
            delivered = report.delivered,
            failed = report.failed,
            "dispatch finished"
        );
        Ok(report)
    }

    async fn deliver(&self, subscriber: &Subscriber, messages: &[(&Notice, String)]) -> DispatchReport {
        let mut report = DispatchReport {
            subscribers: 1,
            ..DispatchReport::default()
        };
        for (notice, text) in messages {
            if !subscriber.wants(notice) {
                continue;
            }
            match self.chat.send_message(&subscriber.destination, text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        user_id = subscriber.user_id,
                        notice = notice.notice_type_str(),
                        error = %e,
                        "notification delivery failed"
                    );
                }
            }
        }
        report
    }
}
