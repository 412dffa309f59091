//! HTTP feed client.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use super::FeedSource;
use crate::error::NotifierError;

/// `reqwest`-backed [`FeedSource`] that appends resource names to a base URL.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeedClient {
    /// Builds a client for `base_url` sending `language` in the `Language`
    /// header.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Internal`] if the HTTP client cannot be
    /// constructed or `language` is not a valid header value.
    pub fn new(base_url: &str, language: &str, timeout: Duration) -> Result<Self, NotifierError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("worldstate-notifier/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "language",
            HeaderValue::from_str(language)
                .map_err(|e| NotifierError::Internal(format!("invalid feed language: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Internal(format!("failed to build feed client: {e}")))?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    /// Base URL with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl FeedSource for HttpFeedClient {
    async fn fetch(&self, resource: &str) -> Result<Value, NotifierError> {
        let url = format!("{}{resource}", self.base_url);
        let transport = |e: reqwest::Error| NotifierError::FeedTransport {
            resource: resource.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::FeedStatus {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        tracing::trace!(resource, bytes = body.len(), "feed response received");

        serde_json::from_slice(&body).map_err(|e| NotifierError::Parse {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let Ok(client) = HttpFeedClient::new(
            "https://api.warframestat.us/pc",
            "en",
            Duration::from_secs(5),
        ) else {
            panic!("client should build");
        };
        assert_eq!(client.base_url(), "https://api.warframestat.us/pc/");
    }

    #[test]
    fn invalid_language_is_rejected() {
        let result = HttpFeedClient::new("http://localhost/", "en\n", Duration::from_secs(5));
        assert!(result.is_err());
    }
}
