//! Base request layer shared by the Conversation, Discovery and
//! Speech-to-Text clients.
//!
//! A service wrapper describes each call as an [`ApiRequest`]. [`WatsonService`]
//! turns it into a `reqwest::Request` by resolving the path template against the
//! configured base URL, putting the `version` query parameter first (for
//! services that have one), and applying credentials and default headers. The
//! request is then handed to an [`HttpTransport`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::config::{DEFAULT_CONNECT_TIMEOUT_SECS, ServiceConfig, ServiceKind};
use crate::errors::{WatsonError, WatsonResult};

mod request;
mod transport;

pub use request::{ApiRequest, QueryValue, RequestBody, required, required_present};
pub use transport::HttpTransport;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("watson-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Header carrying a pre-obtained Watson token
pub const TOKEN_HEADER: &str = "X-Watson-Authorization-Token";

/// Header that opts the request out of Watson's data collection
pub const LEARNING_OPT_OUT_HEADER: &str = "X-Watson-Learning-Opt-Out";

/// Configured connection to one Watson service.
#[derive(Clone)]
pub struct WatsonService {
    kind: ServiceKind,
    config: ServiceConfig,
    base_url: Url,
    client: reqwest::Client,
    transport: Arc<dyn HttpTransport>,
    request_counter: Arc<AtomicU64>,
}

impl std::fmt::Debug for WatsonService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatsonService")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

impl WatsonService {
    /// Validate `config` and build the HTTP client.
    pub fn new(kind: ServiceKind, config: ServiceConfig) -> WatsonResult<Self> {
        config.validate(kind)?;

        let base_url = Url::parse(config.url_or_default(kind))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WatsonError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        debug!(service = %kind, url = %base_url, "Created Watson service client");

        Ok(Self {
            kind,
            config,
            base_url,
            transport: Arc::new(client.clone()),
            client,
            request_counter: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Replace the transport used to execute requests.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Username and password when HTTP Basic credentials are configured.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.config.token.as_ref().map(|t| t.as_str()).filter(|t| !t.is_empty())
    }

    /// Full URL for `request`, with `version` ahead of the request's own query.
    pub fn request_url(&self, request: &ApiRequest) -> WatsonResult<Url> {
        let mut url = request.build_url(&self.base_url)?;

        if self.kind.requires_version_date()
            && let Some(version) = &self.config.version_date
        {
            let existing: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            url.set_query(None);
            url.query_pairs_mut()
                .append_pair("version", version)
                .extend_pairs(existing.iter());
        }

        Ok(url)
    }

    /// Build the outgoing request without sending it.
    pub fn prepare(&self, request: ApiRequest) -> WatsonResult<reqwest::Request> {
        let url = self.request_url(&request)?;
        let ApiRequest {
            method,
            headers,
            body,
            ..
        } = request;

        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some((username, password)) = self.basic_credentials() {
            builder = builder.basic_auth(username, Some(password));
        } else if let Some(token) = self.token() {
            builder = builder.header(TOKEN_HEADER, token);
        }

        if self.config.learning_opt_out {
            builder = builder.header(LEARNING_OPT_OUT_HEADER, "true");
        }

        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(secs) = self.config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.json(&json),
            RequestBody::Bytes { data, content_type } => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            RequestBody::Stream { body, content_type } => {
                builder.header(CONTENT_TYPE, content_type).body(body)
            }
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        // Per-call headers win over defaults and body content types
        let mut request = builder.build()?;
        for (name, value) in headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| WatsonError::Configuration(format!("Invalid header name {name}: {e}")))?;
            let value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| WatsonError::Configuration(format!("Invalid header value: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        Ok(request)
    }

    /// Send `request` and fail on any non-2xx status.
    pub async fn send(&self, request: ApiRequest) -> WatsonResult<reqwest::Response> {
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let prepared = self.prepare(request)?;

        debug!(
            request_id = request_id,
            service = %self.kind,
            method = %prepared.method(),
            url = %prepared.url(),
            "Sending Watson request"
        );

        let response = self.transport.execute(prepared).await.map_err(|e| {
            error!(request_id = request_id, error = %e, "Watson request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                request_id = request_id,
                status = %status,
                body = %body,
                "Watson service returned error"
            );
            return Err(WatsonError::from_response(status, &body));
        }

        debug!(request_id = request_id, status = %status, "Watson request succeeded");
        Ok(response)
    }

    /// Send `request` and deserialize the JSON reply.
    ///
    /// An empty body is read as JSON `null`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> WatsonResult<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request whose reply may be empty (deletes, training triggers).
    ///
    /// Empty bodies become [`Value::Null`]; non-JSON text is returned as a string.
    pub async fn send_empty(&self, request: ApiRequest) -> WatsonResult<Value> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

#[cfg(test)]
pub(crate) mod testing;
