//! Crate-wide error type.
//!
//! Every public operation returns [`WatsonResult`]. Validation failures are
//! reported before any I/O happens; failures reported by the remote service
//! are carried in [`WatsonError::Service`] with the status code and the
//! message Watson put in the response body.

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::utils::CallbackUrlError;

/// Result alias used throughout the SDK.
pub type WatsonResult<T> = Result<T, WatsonError>;

/// Message used when Watson rejects the supplied credentials.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: Access is denied due to invalid credentials";

#[derive(Error, Debug)]
pub enum WatsonError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Client-side validation
    // ─────────────────────────────────────────────────────────────────────────────
    /// One or more required parameters were absent or empty.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    /// Invalid or incomplete service configuration.
    #[error("Argument error: {0}")]
    Configuration(String),

    /// No username/password or token and the service is not unauthenticated.
    #[error(
        "Insufficient credentials provided. Supply username and password, or a token, \
         or set use_unauthenticated"
    )]
    InsufficientCredentials,

    /// Callback URL rejected before it was sent.
    #[error("Invalid callback URL: {0}")]
    CallbackUrl(#[from] CallbackUrlError),

    /// The service URL or a request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ─────────────────────────────────────────────────────────────────────────────
    // Remote failures
    // ─────────────────────────────────────────────────────────────────────────────
    /// Non-2xx reply from the Watson service.
    #[error("{error} (status {code})")]
    Service {
        code: u16,
        error: String,
        description: Option<String>,
        body: Option<Value>,
    },

    /// A custom language model reported `failed` while waiting for it.
    #[error("Customization {customization_id} failed: {detail}")]
    CustomizationFailed {
        customization_id: String,
        detail: String,
    },

    /// Transport-level failure (DNS, TLS, connection reset, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// An operation did not complete in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Payload and streaming
    // ─────────────────────────────────────────────────────────────────────────────
    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading local audio or document files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or framing failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The stream was already finished or its connection is gone.
    #[error("Stream is closed")]
    StreamClosed,
}

impl From<reqwest::Error> for WatsonError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WatsonError::Timeout(e.to_string())
        } else {
            WatsonError::Network(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for WatsonError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        WatsonError::WebSocket(e.to_string())
    }
}

impl WatsonError {
    /// Build a [`WatsonError::Service`] from a failed response.
    ///
    /// Watson error bodies take several shapes depending on the service:
    /// `{"error": "..."}`, `{"error": {"message": "..."}}`,
    /// `{"code": 404, "error": "...", "description": "..."}`, or plain text.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let mut message = parsed.as_ref().and_then(|v| match v.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(obj)) => obj
                .get("message")
                .or_else(|| obj.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => v.get("message").and_then(Value::as_str).map(str::to_string),
        });

        if status == StatusCode::UNAUTHORIZED {
            message = Some(UNAUTHORIZED_MESSAGE.to_string());
        }

        let error = message.unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status.as_u16());

        let description = parsed
            .as_ref()
            .and_then(|v| v.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string);

        WatsonError::Service {
            code,
            error,
            description,
            body: parsed,
        }
    }

    /// HTTP status code for service errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            WatsonError::Service { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for failures worth retrying (rate limiting, 5xx, timeouts).
    pub fn is_transient(&self) -> bool {
        match self {
            WatsonError::Service { code, .. } => *code == 429 || *code >= 500,
            WatsonError::Timeout(_) | WatsonError::Network(_) => true,
            _ => false,
        }
    }
}
