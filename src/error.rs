//! Notifier error types with HTTP status code mapping.
//!
//! [`NotifierError`] is the central error type for the notifier. Feed,
//! chat and store failures all flow through it; none of them is fatal to
//! the poll loop or the process. The status API renders it as a
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "subscriber not found: 42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Notifier error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                |
/// |-----------|----------------------|----------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request            |
/// | 2000–2999 | Not Found            | 404 Not Found              |
/// | 3000–3999 | Server / Store       | 500 Internal Server Error  |
/// | 5000–5999 | Upstream / Transport | 502 Bad Gateway            |
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// The feed request could not be completed (DNS, connect, timeout, body).
    #[error("feed transport error on {resource}: {message}")]
    FeedTransport {
        /// Feed resource name (e.g. `"invasions"`).
        resource: String,
        /// Underlying transport message.
        message: String,
    },

    /// The feed answered with a non-success HTTP status.
    #[error("feed returned HTTP {status} for {resource}")]
    FeedStatus {
        /// Feed resource name.
        resource: String,
        /// HTTP status code returned by the feed.
        status: u16,
    },

    /// A feed body could not be interpreted at all.
    #[error("malformed {resource} payload: {message}")]
    Parse {
        /// Feed resource name.
        resource: String,
        /// Parser message.
        message: String,
    },

    /// Sending to or polling the chat transport failed.
    #[error("chat transport error: {0}")]
    ChatTransport(String),

    /// Reading or writing a document collection failed.
    #[error("store error on {collection}: {message}")]
    Store {
        /// Collection name (e.g. `"users"`).
        collection: String,
        /// Underlying I/O or serialization message.
        message: String,
    },

    /// No subscriber with the given user id exists.
    #[error("subscriber not found: {0}")]
    SubscriberNotFound(i64),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NotifierError {
    /// Builds a [`NotifierError::Store`] for the given collection.
    pub fn store(collection: &str, message: impl ToString) -> Self {
        Self::Store {
            collection: collection.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns `true` for feed and chat transport failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::FeedTransport { .. } | Self::FeedStatus { .. } | Self::ChatTransport(_)
        )
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SubscriberNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Store { .. } => 3001,
            Self::FeedTransport { .. } => 5001,
            Self::FeedStatus { .. } => 5002,
            Self::Parse { .. } => 5003,
            Self::ChatTransport(_) => 5004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SubscriberNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::FeedTransport { .. }
            | Self::FeedStatus { .. }
            | Self::Parse { .. }
            | Self::ChatTransport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for NotifierError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
