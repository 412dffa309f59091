//! Chat layer: outbound delivery and inbound commands.
//!
//! [`ChatTransport`] is the seam to the messaging platform. The dispatcher
//! only needs [`ChatTransport::send_message`]; the inbound loop in
//! [`commands`] long-polls [`ChatTransport::next_updates`] and answers each
//! update on its own task.

pub mod commands;
pub mod telegram;

use std::future::Future;
use std::time::Duration;

use crate::error::NotifierError;

pub use commands::CommandHandler;
pub use telegram::TelegramClient;

/// One text message received from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Platform update id; used to acknowledge the update.
    pub update_id: i64,
    /// Sender identity.
    pub user_id: i64,
    /// Chat the reply goes to.
    pub chat_id: String,
    /// Raw message text.
    pub text: String,
}

/// Result of one long-poll for updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Highest update id seen, including updates that carried no usable
    /// text. `None` when the poll returned nothing.
    pub last_update_id: Option<i64>,
    /// Text messages in arrival order.
    pub messages: Vec<InboundMessage>,
}

impl UpdateBatch {
    /// Offset to request next so that this batch is acknowledged.
    #[must_use]
    pub fn next_offset(&self, current: i64) -> i64 {
        self.last_update_id.map_or(current, |id| id + 1)
    }
}

/// Sends and receives chat messages.
pub trait ChatTransport: Send + Sync {
    /// Sends `text` to `destination`.
    ///
    /// Implementations return [`NotifierError::ChatTransport`] on failure.
    fn send_message(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifierError>> + Send;

    /// Waits up to `timeout` for updates with id `>= offset`.
    fn next_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> impl Future<Output = Result<UpdateBatch, NotifierError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_keeps_offset() {
        assert_eq!(UpdateBatch::default().next_offset(17), 17);
    }

    #[test]
    fn batch_acknowledges_last_update() {
        let batch = UpdateBatch {
            last_update_id: Some(41),
            messages: Vec::new(),
        };
        assert_eq!(batch.next_offset(0), 42);
    }
}
