//! Notifier configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Only the chat token is mandatory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level notifier configuration.
///
/// Loaded once at startup via [`NotifierConfig::from_env`].
#[derive(Clone)]
pub struct NotifierConfig {
    /// Chat bot API token.
    pub telegram_bot_token: String,

    /// Base URL of the chat bot API.
    pub telegram_api_url: String,

    /// Base URL of the live game-status feed. Resource names are appended.
    pub feed_base_url: String,

    /// Value of the `Language` header sent with every feed request.
    pub feed_language: String,

    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,

    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,

    /// Directory holding the document store collections.
    pub data_dir: PathBuf,

    /// Socket address for the status API (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Whether to serve the status API at all.
    pub status_api_enabled: bool,

    /// Long-poll timeout in seconds for inbound chat updates.
    pub inbound_poll_timeout_secs: u64,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("telegram_bot_token", &mask_token(&self.telegram_bot_token))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("feed_base_url", &self.feed_base_url)
            .field("feed_language", &self.feed_language)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("data_dir", &self.data_dir)
            .field("listen_addr", &self.listen_addr)
            .field("status_api_enabled", &self.status_api_enabled)
            .field("inbound_poll_timeout_secs", &self.inbound_poll_timeout_secs)
            .finish()
    }
}

impl NotifierConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `TELEGRAM_BOT_TOKEN` is missing or empty, or if
    /// `LISTEN_ADDR` is set but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or("TELEGRAM_BOT_TOKEN is not set")?;

        let telegram_api_url = std::env::var("TELEGRAM_API_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());

        let feed_base_url = std::env::var("FEED_BASE_URL")
            .unwrap_or_else(|_| "https://api.warframestat.us/pc/".to_string());
        let feed_language = std::env::var("FEED_LANGUAGE").unwrap_or_else(|_| "en".to_string());

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let data_dir =
            PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "Data".to_string()));

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            feed_base_url,
            feed_language,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 15),
            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", 300),
            data_dir,
            listen_addr,
            status_api_enabled: parse_env_bool("STATUS_API_ENABLED", true),
            inbound_poll_timeout_secs: parse_env("INBOUND_POLL_TIMEOUT_SECS", 30),
        })
    }

    /// Poll cadence as a [`Duration`]. Never zero.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// HTTP request timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Long-poll wait for inbound chat updates.
    #[must_use]
    pub fn inbound_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.inbound_poll_timeout_secs)
    }

    /// Token with everything but the first and last six characters hidden.
    #[must_use]
    pub fn masked_token(&self) -> String {
        mask_token(&self.telegram_bot_token)
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars.iter().skip(chars.len() - 6).collect();
    format!("{head}...{tail}")
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(mask_token("abc"), "***");
    }

    #[test]
    fn long_tokens_keep_head_and_tail() {
        let masked = mask_token("123456:ABCDEFGHIJKLMNOPQRSTUV");
        assert_eq!(masked, "123456...QRSTUV");
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("WORLDSTATE_NOTIFIER_TEST_UNSET_KEY", 300);
        assert_eq!(value, 300);
        assert!(parse_env_bool("WORLDSTATE_NOTIFIER_TEST_UNSET_KEY", true));
    }
}
