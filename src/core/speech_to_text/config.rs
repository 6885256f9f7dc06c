//! Parameter types for the Speech-to-Text v1 API.
//!
//! Required parameters are plain `String` fields and are checked for
//! emptiness before any request goes out; everything optional is an
//! `Option` and is omitted from the request when `None`.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::core::service::ApiRequest;
use crate::errors::{WatsonError, WatsonResult};

// =============================================================================
// Constants
// =============================================================================

/// Model used by the service when none is given.
pub const DEFAULT_MODEL: &str = "en-US_BroadbandModel";

/// Name of the cookie that pins a recognition session to one engine.
pub const SESSION_COOKIE: &str = "SESSIONID";

/// Default polling interval for [`WhenReadyOptions`].
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound for [`WhenReadyOptions`].
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Audio
// =============================================================================

/// Audio (or other upload) payload.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// In-memory audio.
    Bytes(Bytes),
    /// Audio streamed from a local file.
    File(PathBuf),
}

impl Default for AudioSource {
    fn default() -> Self {
        Self::Bytes(Bytes::new())
    }
}

impl AudioSource {
    /// Empty in-memory audio counts as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::File(path) => path.as_os_str().is_empty(),
        }
    }

    /// Attach this audio to `request` as its body.
    pub(crate) async fn attach(&self, request: ApiRequest, content_type: &str) -> WatsonResult<ApiRequest> {
        match self {
            Self::Bytes(bytes) => Ok(request.bytes(bytes.clone(), content_type)),
            Self::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(request.stream(reqwest::Body::from(file), content_type))
            }
        }
    }
}

impl From<Bytes> for AudioSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for AudioSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for AudioSource {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

// =============================================================================
// Recognition options
// =============================================================================

/// Recognition settings shared by `recognize`, recognition jobs and the
/// WebSocket interface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecognitionOptions {
    pub model: Option<String>,
    pub customization_id: Option<String>,
    pub continuous: Option<bool>,
    pub max_alternatives: Option<u32>,
    pub timestamps: Option<bool>,
    pub word_confidence: Option<bool>,
    /// Seconds of silence before the service closes the connection; `-1` disables it.
    pub inactivity_timeout: Option<i32>,
    pub interim_results: Option<bool>,
    pub keywords: Option<Vec<String>>,
    pub keywords_threshold: Option<f64>,
    pub word_alternatives_threshold: Option<f64>,
    pub profanity_filter: Option<bool>,
    pub smart_formatting: Option<bool>,
    pub speaker_labels: Option<bool>,
}

impl RecognitionOptions {
    /// Append every supplied option as a query parameter.
    pub(crate) fn apply_query(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("continuous", self.continuous)
            .query_opt("max_alternatives", self.max_alternatives)
            .query_opt("timestamps", self.timestamps)
            .query_opt("word_confidence", self.word_confidence)
            .query_opt("inactivity_timeout", self.inactivity_timeout)
            .query_opt("model", self.model.as_deref())
            .query_opt("interim_results", self.interim_results)
            .query_list("keywords", self.keywords.as_deref())
            .query_opt("keywords_threshold", self.keywords_threshold)
            .query_opt("word_alternatives_threshold", self.word_alternatives_threshold)
            .query_opt("profanity_filter", self.profanity_filter)
            .query_opt("smart_formatting", self.smart_formatting)
            .query_opt("customization_id", self.customization_id.as_deref())
            .query_opt("speaker_labels", self.speaker_labels)
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    pub model: Option<String>,
    pub customization_id: Option<String>,
}

/// Session identified by id, with the cookie returned at creation if known.
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    pub session_id: String,
    pub cookie_session: Option<String>,
}

impl SessionParams {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            cookie_session: None,
        }
    }

    pub fn with_cookie(mut self, cookie_session: impl Into<String>) -> Self {
        self.cookie_session = Some(cookie_session.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObserveResultParams {
    pub session_id: String,
    pub cookie_session: String,
    pub interim_results: Option<bool>,
}

// =============================================================================
// Recognition
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RecognizeParams {
    pub audio: AudioSource,
    /// MIME type of the audio, e.g. `audio/l16;rate=16000` or `audio/wav`.
    pub content_type: String,
    /// Recognize on an existing session instead of sessionless.
    pub session_id: Option<String>,
    pub cookie_session: Option<String>,
    pub options: RecognitionOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RecognizeLiveParams {
    pub session_id: String,
    pub cookie_session: String,
    pub content_type: String,
    pub options: RecognitionOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RecognizeStreamParams {
    pub content_type: String,
    pub options: RecognitionOptions,
    /// How long to wait for the WebSocket handshake.
    pub connect_timeout: Option<Duration>,
    /// How long to wait for the service's first `listening` state.
    pub listening_timeout: Option<Duration>,
}

impl RecognizeStreamParams {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Default::default()
        }
    }

    /// Build the `ws(s)://.../v1/recognize` URL from the service base URL.
    pub fn build_websocket_url(
        &self,
        base: &Url,
        token: Option<&str>,
        learning_opt_out: bool,
    ) -> WatsonResult<Url> {
        let mut url = base.clone();

        let scheme = match base.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(WatsonError::Configuration(format!(
                    "Unsupported URL scheme for streaming recognition: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| WatsonError::Configuration(format!("Cannot use {scheme} scheme for {base}")))?;

        url = ApiRequest::get("/v1/recognize")
            .query_opt("model", self.options.model.as_deref())
            .query_opt("customization_id", self.options.customization_id.as_deref())
            .query_opt("watson-token", token)
            .query_opt("x-watson-learning-opt-out", learning_opt_out.then_some(true))
            .build_url(&url)?;

        Ok(url)
    }

    /// Build the `{"action": "start", ...}` message sent after connecting.
    pub fn build_start_message(&self) -> Value {
        let options = &self.options;
        let mut msg = serde_json::json!({
            "action": "start",
            "content-type": self.content_type,
        });

        // Add optional parameters if set
        if let Some(continuous) = options.continuous {
            msg["continuous"] = serde_json::json!(continuous);
        }
        if let Some(max) = options.max_alternatives {
            msg["max_alternatives"] = serde_json::json!(max);
        }
        if let Some(timestamps) = options.timestamps {
            msg["timestamps"] = serde_json::json!(timestamps);
        }
        if let Some(word_confidence) = options.word_confidence {
            msg["word_confidence"] = serde_json::json!(word_confidence);
        }
        if let Some(timeout) = options.inactivity_timeout {
            msg["inactivity_timeout"] = serde_json::json!(timeout);
        }
        if let Some(interim) = options.interim_results {
            msg["interim_results"] = serde_json::json!(interim);
        }
        if let Some(keywords) = &options.keywords {
            msg["keywords"] = serde_json::json!(keywords);
        }
        if let Some(threshold) = options.keywords_threshold {
            msg["keywords_threshold"] = serde_json::json!(threshold);
        }
        if let Some(threshold) = options.word_alternatives_threshold {
            msg["word_alternatives_threshold"] = serde_json::json!(threshold);
        }
        if let Some(filter) = options.profanity_filter {
            msg["profanity_filter"] = serde_json::json!(filter);
        }
        if let Some(smart) = options.smart_formatting {
            msg["smart_formatting"] = serde_json::json!(smart);
        }
        if let Some(labels) = options.speaker_labels {
            msg["speaker_labels"] = serde_json::json!(labels);
        }

        msg
    }
}

// =============================================================================
// Asynchronous recognition
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RegisterCallbackParams {
    pub callback_url: String,
    /// Secret used by the service to sign callback notifications.
    pub user_secret: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateRecognitionJobParams {
    pub audio: AudioSource,
    pub content_type: String,
    pub callback_url: Option<String>,
    /// e.g. `recognitions.started`, `recognitions.completed_with_results`.
    pub events: Option<Vec<String>>,
    pub user_token: Option<String>,
    /// Minutes the results are kept after the job completes.
    pub results_ttl: Option<u32>,
    pub options: RecognitionOptions,
}

// =============================================================================
// Custom language models
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCustomizationParams {
    pub name: String,
    pub base_model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrainCustomizationParams {
    pub customization_id: String,
    /// `all` or `user`.
    pub word_type_to_add: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddCorpusParams {
    pub customization_id: String,
    pub name: String,
    /// Plain-text corpus content.
    pub corpus: String,
    pub allow_overwrite: Option<bool>,
}

/// A word entry for [`AddWordsParams`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomWord {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sounds_like: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_as: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddWordsParams {
    pub customization_id: String,
    pub words: Vec<CustomWord>,
}

#[derive(Debug, Clone, Default)]
pub struct AddWordParams {
    pub customization_id: String,
    pub word: String,
    pub sounds_like: Option<Vec<String>>,
    pub display_as: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetWordsParams {
    pub customization_id: String,
    /// `all`, `user` or `corpora`.
    pub word_type: Option<String>,
    /// `alphabetical`/`count`, optionally prefixed with `+`/`-`.
    pub sort: Option<String>,
}

/// Polling bounds for `when_customization_ready`.
#[derive(Debug, Clone, Copy)]
pub struct WhenReadyOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WhenReadyOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_READY_INTERVAL,
            timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}
