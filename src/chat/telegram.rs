//! Telegram Bot API client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{ChatTransport, InboundMessage, UpdateBatch};
use crate::error::NotifierError;

/// `reqwest`-backed [`ChatTransport`] speaking the Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The endpoint embeds the bot token.
        f.debug_struct("TelegramClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    from: Option<User>,
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl TelegramClient {
    /// Builds a client for `api_url` authenticated with `token`.
    ///
    /// `request_timeout` bounds ordinary calls; long polls get their own
    /// wait added on top.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Internal`] if the HTTP client cannot be
    /// constructed.
    pub fn new(api_url: &str, token: &str, request_timeout: Duration) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| NotifierError::Internal(format!("failed to build chat client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            request_timeout,
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T, NotifierError> {
        let url = format!("{}/{method}", self.endpoint);
        // Drop the URL from reqwest errors; it carries the token.
        let transport = |e: reqwest::Error| {
            NotifierError::ChatTransport(format!("{method}: {}", e.without_url()))
        };

        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(transport)?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(NotifierError::ChatTransport(format!(
                "{method} returned HTTP {}: {}",
                status.as_u16(),
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

impl ChatTransport for TelegramClient {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifierError> {
        let body = json!({ "chat_id": destination, "text": text });
        self.call::<serde_json::Value>("sendMessage", &body, self.request_timeout)
            .await?;
        tracing::trace!(destination, "message sent");
        Ok(())
    }

    async fn next_updates(&self, offset: i64, timeout: Duration) -> Result<UpdateBatch, NotifierError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        let updates: Vec<Update> = self
            .call("getUpdates", &body, timeout + self.request_timeout)
            .await?;
        Ok(into_batch(updates))
    }
}

/// Keeps text messages with a known sender; everything else is only
/// acknowledged.
fn into_batch(updates: Vec<Update>) -> UpdateBatch {
    let last_update_id = updates.iter().map(|u| u.update_id).max();
    let messages = updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            let (Some(user), Some(text)) = (message.from, message.text) else {
                tracing::debug!(update_id = update.update_id, "skipping update without text");
                return None;
            };
            Some(InboundMessage {
                update_id: update.update_id,
                user_id: user.id,
                chat_id: message.chat.id.to_string(),
                text,
            })
        })
        .collect();
    UpdateBatch {
        last_update_id,
        messages,
    }
}
