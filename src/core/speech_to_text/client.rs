//! Speech-to-Text v1 client.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::config::*;
use super::live::{LIVE_CHANNEL_CAPACITY, LiveRecognition, drain_json_values};
use super::messages::Session;
use super::stream::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_LISTENING_TIMEOUT, RecognizeStream, StreamConnection};
use crate::config::{ServiceConfig, ServiceKind};
use crate::core::service::{ApiRequest, HttpTransport, WatsonService, required, required_present};
use crate::errors::{WatsonError, WatsonResult};
use crate::utils::validate_callback_url;

/// Client for the Watson Speech-to-Text v1 API.
#[derive(Debug, Clone)]
pub struct SpeechToText {
    service: WatsonService,
}

fn session_cookie(cookie_session: &str) -> String {
    format!("{SESSION_COOKIE}={cookie_session}")
}

/// Attach the session cookie when one is known.
fn with_cookie(request: ApiRequest, cookie_session: Option<&str>) -> ApiRequest {
    match cookie_session.filter(|c| !c.is_empty()) {
        Some(cookie) => request.header(COOKIE.as_str(), session_cookie(cookie)),
        None => request,
    }
}

/// Value of the `SESSIONID` cookie among the response's `Set-Cookie` headers.
pub(crate) fn extract_session_cookie(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::to_string)
}

// =============================================================================
// Request builders
// =============================================================================

pub(crate) fn get_model_request(model_id: &str) -> WatsonResult<ApiRequest> {
    required(&[("model_id", model_id)])?;
    Ok(ApiRequest::get("/v1/models/{model_id}").path_param("model_id", model_id))
}

pub(crate) fn create_session_request(params: &CreateSessionParams) -> ApiRequest {
    ApiRequest::post("/v1/sessions")
        .query_opt("model", params.model.as_deref())
        .query_opt("customization_id", params.customization_id.as_deref())
}

pub(crate) fn delete_session_request(params: &SessionParams) -> WatsonResult<ApiRequest> {
    required(&[("session_id", params.session_id.as_str())])?;
    Ok(with_cookie(
        ApiRequest::delete("/v1/sessions/{session_id}").path_param("session_id", params.session_id.as_str()),
        params.cookie_session.as_deref(),
    ))
}

pub(crate) fn recognize_status_request(params: &SessionParams) -> WatsonResult<ApiRequest> {
    required(&[("session_id", params.session_id.as_str())])?;
    Ok(with_cookie(
        ApiRequest::get("/v1/sessions/{session_id}/recognize")
            .path_param("session_id", params.session_id.as_str()),
        params.cookie_session.as_deref(),
    ))
}

pub(crate) fn observe_result_request(params: &ObserveResultParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("session_id", params.session_id.as_str()),
        ("cookie_session", params.cookie_session.as_str()),
    ])?;
    Ok(with_cookie(
        ApiRequest::get("/v1/sessions/{session_id}/observe_result")
            .path_param("session_id", params.session_id.as_str())
            .query_opt("interim_results", params.interim_results),
        Some(params.cookie_session.as_str()),
    ))
}

/// Validation and URL shape for `recognize`, before the audio is attached.
pub(crate) fn recognize_request(params: &RecognizeParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("audio", !params.audio.is_empty()),
        ("content_type", !params.content_type.trim().is_empty()),
    ])?;

    let request = match params.session_id.as_deref().filter(|s| !s.is_empty()) {
        Some(session_id) => with_cookie(
            ApiRequest::post("/v1/sessions/{session_id}/recognize").path_param("session_id", session_id),
            params.cookie_session.as_deref(),
        ),
        None => ApiRequest::post("/v1/recognize"),
    };

    Ok(params.options.apply_query(request))
}

pub(crate) fn recognize_live_request(params: &RecognizeLiveParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("session_id", params.session_id.as_str()),
        ("cookie_session", params.cookie_session.as_str()),
        ("content_type", params.content_type.as_str()),
    ])?;
    let request = ApiRequest::post("/v1/sessions/{session_id}/recognize")
        .path_param("session_id", params.session_id.as_str());
    Ok(with_cookie(
        params.options.apply_query(request),
        Some(params.cookie_session.as_str()),
    ))
}

pub(crate) fn register_callback_request(params: &RegisterCallbackParams) -> WatsonResult<ApiRequest> {
    required(&[("callback_url", params.callback_url.as_str())])?;
    validate_callback_url(&params.callback_url)?;
    Ok(ApiRequest::post("/v1/register_callback")
        .query("callback_url", params.callback_url.as_str())
        .query_opt("user_secret", params.user_secret.as_deref()))
}

pub(crate) fn unregister_callback_request(callback_url: &str) -> WatsonResult<ApiRequest> {
    required(&[("callback_url", callback_url)])?;
    Ok(ApiRequest::post("/v1/unregister_callback").query("callback_url", callback_url))
}

pub(crate) fn create_recognition_job_request(params: &CreateRecognitionJobParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("audio", !params.audio.is_empty()),
        ("content_type", !params.content_type.trim().is_empty()),
    ])?;
    if let Some(callback_url) = params.callback_url.as_deref() {
        validate_callback_url(callback_url)?;
    }

    let request = ApiRequest::post("/v1/recognitions")
        .query_opt("callback_url", params.callback_url.as_deref())
        .query_list("events", params.events.as_deref())
        .query_opt("user_token", params.user_token.as_deref())
        .query_opt("results_ttl", params.results_ttl);

    Ok(params.options.apply_query(request))
}

pub(crate) fn recognition_job_request(
    method: reqwest::Method,
    id: &str,
) -> WatsonResult<ApiRequest> {
    required(&[("id", id)])?;
    Ok(ApiRequest::new(method, "/v1/recognitions/{id}").path_param("id", id))
}

fn customization_request(
    method: reqwest::Method,
    path: &'static str,
    customization_id: &str,
) -> WatsonResult<ApiRequest> {
    required(&[("customization_id", customization_id)])?;
    Ok(ApiRequest::new(method, path).path_param("customization_id", customization_id))
}

pub(crate) fn create_customization_request(params: &CreateCustomizationParams) -> WatsonResult<ApiRequest> {
    required(&[("name", params.name.as_str()), ("base_model_name", params.base_model_name.as_str())])?;
    Ok(ApiRequest::post("/v1/customizations").json(serde_json::to_value(params)?))
}

pub(crate) fn add_corpus_request(params: &AddCorpusParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("customization_id", params.customization_id.as_str()),
        ("name", params.name.as_str()),
        ("corpus", params.corpus.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/customizations/{customization_id}/corpora/{name}")
        .path_param("customization_id", params.customization_id.as_str())
        .path_param("name", params.name.as_str())
        .query_opt("allow_overwrite", params.allow_overwrite)
        .bytes(Bytes::from(params.corpus.clone()), "text/plain"))
}

pub(crate) fn add_words_request(params: &AddWordsParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("customization_id", !params.customization_id.trim().is_empty()),
        ("words", !params.words.is_empty()),
    ])?;
    Ok(ApiRequest::post("/v1/customizations/{customization_id}/words")
        .path_param("customization_id", params.customization_id.as_str())
        .json(json!({ "words": params.words })))
}

pub(crate) fn add_word_request(params: &AddWordParams) -> WatsonResult<ApiRequest> {
    required(&[("customization_id", params.customization_id.as_str()), ("word", params.word.as_str())])?;

    let mut body = json!({});
    if let Some(sounds_like) = &params.sounds_like {
        body["sounds_like"] = json!(sounds_like);
    }
    if let Some(display_as) = &params.display_as {
        body["display_as"] = json!(display_as);
    }

    Ok(ApiRequest::put("/v1/customizations/{customization_id}/words/{word}")
        .path_param("customization_id", params.customization_id.as_str())
        .path_param("word", params.word.as_str())
        .json(body))
}

pub(crate) fn get_words_request(params: &GetWordsParams) -> WatsonResult<ApiRequest> {
    Ok(customization_request(
        reqwest::Method::GET,
        "/v1/customizations/{customization_id}/words",
        &params.customization_id,
    )?
    .query_opt("word_type", params.word_type.as_deref())
    .query_opt("sort", params.sort.as_deref()))
}

// =============================================================================
// Client
// =============================================================================

impl SpeechToText {
    /// Create a client; fails without credentials unless `use_unauthenticated` is set.
    pub fn new(config: ServiceConfig) -> WatsonResult<Self> {
        Ok(Self {
            service: WatsonService::new(ServiceKind::SpeechToText, config)?,
        })
    }

    /// Create a client with configuration from `SPEECH_TO_TEXT_*` variables.
    pub fn from_env() -> WatsonResult<Self> {
        Self::new(ServiceConfig::from_env(ServiceKind::SpeechToText))
    }

    /// Replace the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.service = self.service.with_transport(transport);
        self
    }

    pub fn service(&self) -> &WatsonService {
        &self.service
    }

    // -------------------------------------------------------------------------
    // Models
    // -------------------------------------------------------------------------

    /// List all available models.
    pub async fn get_models(&self) -> WatsonResult<Value> {
        self.service.send_json(ApiRequest::get("/v1/models")).await
    }

    pub async fn get_model(&self, model_id: &str) -> WatsonResult<Value> {
        self.service.send_json(get_model_request(model_id)?).await
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Create a session; `cookie_session` is taken from the `SESSIONID` cookie.
    pub async fn create_session(&self, params: &CreateSessionParams) -> WatsonResult<Session> {
        let response = self.service.send(create_session_request(params)).await?;
        let cookie = extract_session_cookie(response.headers());
        let body = response.bytes().await?;

        let mut session: Session = serde_json::from_slice(&body)?;
        session.cookie_session = cookie;

        info!(session_id = %session.session_id, "Created recognition session");
        Ok(session)
    }

    pub async fn delete_session(&self, params: &SessionParams) -> WatsonResult<Value> {
        self.service.send_empty(delete_session_request(params)?).await
    }

    /// State of the session's recognize endpoint (`initialized`, `listening`, ...).
    pub async fn get_recognize_status(&self, params: &SessionParams) -> WatsonResult<Value> {
        self.service.send_json(recognize_status_request(params)?).await
    }

    /// Long-poll for results of a recognize request on the session.
    ///
    /// The service streams concatenated JSON objects; each one becomes an item.
    pub async fn observe_result(
        &self,
        params: &ObserveResultParams,
    ) -> WatsonResult<impl Stream<Item = WatsonResult<Value>> + Send + 'static> {
        let response = self.service.send(observe_result_request(params)?).await?;
        let mut body = response.bytes_stream();

        Ok(async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);
                        let drained = drain_json_values(&mut buffer);
                        for value in drained.values {
                            yield Ok(value);
                        }
                        if let Some(e) = drained.error {
                            yield Err(e);
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(WatsonError::from(e));
                        return;
                    }
                }
            }

            if !buffer.iter().all(u8::is_ascii_whitespace) {
                yield Err(WatsonError::Network("Result stream ended mid-object".to_string()));
            }
        })
    }

    // -------------------------------------------------------------------------
    // Recognition
    // -------------------------------------------------------------------------

    /// Recognize an audio file or buffer in one request.
    pub async fn recognize(&self, params: &RecognizeParams) -> WatsonResult<Value> {
        let request = recognize_request(params)?;
        let request = params.audio.attach(request, &params.content_type).await?;
        self.service.send_json(request).await
    }

    /// Start a chunked upload into an existing session.
    pub async fn recognize_live(&self, params: &RecognizeLiveParams) -> WatsonResult<LiveRecognition> {
        let request = recognize_live_request(params)?;

        let (tx, mut rx) = mpsc::channel::<Bytes>(LIVE_CHANNEL_CAPACITY);
        let body = reqwest::Body::wrap_stream(async_stream::stream! {
            while let Some(chunk) = rx.recv().await {
                yield Ok::<Bytes, std::io::Error>(chunk);
            }
        });
        let request = request.stream(body, params.content_type.clone());

        debug!(session_id = %params.session_id, "Starting live recognition upload");

        let service = self.service.clone();
        let handle = tokio::spawn(async move { service.send_json::<Value>(request).await });

        Ok(LiveRecognition::new(tx, handle))
    }

    /// Open a WebSocket recognition stream.
    pub async fn recognize_stream(&self, params: RecognizeStreamParams) -> WatsonResult<RecognizeStream> {
        required(&[("content_type", params.content_type.as_str())])?;

        let config = self.service.config();
        let url = params.build_websocket_url(
            self.service.base_url(),
            self.service.token(),
            config.learning_opt_out,
        )?;

        let connection = StreamConnection {
            url,
            basic_credentials: self
                .service
                .basic_credentials()
                .map(|(u, p)| (u.to_string(), p.to_string())),
            start_message: params.build_start_message(),
            connect_timeout: params.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            listening_timeout: params.listening_timeout.unwrap_or(DEFAULT_LISTENING_TIMEOUT),
        };

        RecognizeStream::connect(connection).await
    }

    // -------------------------------------------------------------------------
    // Asynchronous recognition
    // -------------------------------------------------------------------------

    /// Register (and have the service verify) a callback URL.
    pub async fn register_callback(&self, params: &RegisterCallbackParams) -> WatsonResult<Value> {
        self.service.send_json(register_callback_request(params)?).await
    }

    pub async fn unregister_callback(&self, callback_url: &str) -> WatsonResult<Value> {
        self.service.send_empty(unregister_callback_request(callback_url)?).await
    }

    pub async fn create_recognition_job(&self, params: &CreateRecognitionJobParams) -> WatsonResult<Value> {
        let request = create_recognition_job_request(params)?;
        let request = params.audio.attach(request, &params.content_type).await?;
        self.service.send_json(request).await
    }

    /// Status of the latest recognition jobs of the caller.
    pub async fn get_recognition_jobs(&self) -> WatsonResult<Value> {
        self.service.send_json(ApiRequest::get("/v1/recognitions")).await
    }

    pub async fn get_recognition_job(&self, id: &str) -> WatsonResult<Value> {
        self.service
            .send_json(recognition_job_request(reqwest::Method::GET, id)?)
            .await
    }

    pub async fn delete_recognition_job(&self, id: &str) -> WatsonResult<Value> {
        self.service
            .send_empty(recognition_job_request(reqwest::Method::DELETE, id)?)
            .await
    }

    // -------------------------------------------------------------------------
    // Custom language models
    // -------------------------------------------------------------------------

    pub async fn create_customization(&self, params: &CreateCustomizationParams) -> WatsonResult<Value> {
        self.service.send_json(create_customization_request(params)?).await
    }

    pub async fn get_customizations(&self, language: Option<&str>) -> WatsonResult<Value> {
        self.service
            .send_json(ApiRequest::get("/v1/customizations").query_opt("language", language))
            .await
    }

    pub async fn get_customization(&self, customization_id: &str) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::GET,
            "/v1/customizations/{customization_id}",
            customization_id,
        )?;
        self.service.send_json(request).await
    }

    pub async fn delete_customization(&self, customization_id: &str) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::DELETE,
            "/v1/customizations/{customization_id}",
            customization_id,
        )?;
        self.service.send_empty(request).await
    }

    pub async fn train_customization(&self, params: &TrainCustomizationParams) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::POST,
            "/v1/customizations/{customization_id}/train",
            &params.customization_id,
        )?
        .query_opt("word_type_to_add", params.word_type_to_add.as_deref());
        self.service.send_empty(request).await
    }

    pub async fn reset_customization(&self, customization_id: &str) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::POST,
            "/v1/customizations/{customization_id}/reset",
            customization_id,
        )?;
        self.service.send_empty(request).await
    }

    pub async fn upgrade_customization(&self, customization_id: &str) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::POST,
            "/v1/customizations/{customization_id}/upgrade_model",
            customization_id,
        )?;
        self.service.send_empty(request).await
    }

    pub async fn add_corpus(&self, params: &AddCorpusParams) -> WatsonResult<Value> {
        self.service.send_empty(add_corpus_request(params)?).await
    }

    pub async fn get_corpora(&self, customization_id: &str) -> WatsonResult<Value> {
        let request = customization_request(
            reqwest::Method::GET,
            "/v1/customizations/{customization_id}/corpora",
            customization_id,
        )?;
        self.service.send_json(request).await
    }

    pub async fn get_corpus(&self, customization_id: &str, name: &str) -> WatsonResult<Value> {
        required(&[("customization_id", customization_id), ("name", name)])?;
        let request = ApiRequest::get("/v1/customizations/{customization_id}/corpora/{name}")
            .path_param("customization_id", customization_id)
            .path_param("name", name);
        self.service.send_json(request).await
    }

    pub async fn delete_corpus(&self, customization_id: &str, name: &str) -> WatsonResult<Value> {
        required(&[("customization_id", customization_id), ("name", name)])?;
        let request = ApiRequest::delete("/v1/customizations/{customization_id}/corpora/{name}")
            .path_param("customization_id", customization_id)
            .path_param("name", name);
        self.service.send_empty(request).await
    }

    pub async fn add_words(&self, params: &AddWordsParams) -> WatsonResult<Value> {
        self.service.send_empty(add_words_request(params)?).await
    }

    pub async fn add_word(&self, params: &AddWordParams) -> WatsonResult<Value> {
        self.service.send_empty(add_word_request(params)?).await
    }

    pub async fn get_words(&self, params: &GetWordsParams) -> WatsonResult<Value> {
        self.service.send_json(get_words_request(params)?).await
    }

    pub async fn get_word(&self, customization_id: &str, word: &str) -> WatsonResult<Value> {
        required(&[("customization_id", customization_id), ("word", word)])?;
        let request = ApiRequest::get("/v1/customizations/{customization_id}/words/{word}")
            .path_param("customization_id", customization_id)
            .path_param("word", word);
        self.service.send_json(request).await
    }

    pub async fn delete_word(&self, customization_id: &str, word: &str) -> WatsonResult<Value> {
        required(&[("customization_id", customization_id), ("word", word)])?;
        let request = ApiRequest::delete("/v1/customizations/{customization_id}/words/{word}")
            .path_param("customization_id", customization_id)
            .path_param("word", word);
        self.service.send_empty(request).await
    }

    /// Poll a custom model until it is `ready` or `available`.
    ///
    /// Fails with [`WatsonError::CustomizationFailed`] when the model reports
    /// `failed`, and with [`WatsonError::Timeout`] once `options.timeout` has
    /// elapsed. A timeout too large to represent (such as `Duration::MAX`)
    /// polls without a deadline.
    pub async fn when_customization_ready(
        &self,
        customization_id: &str,
        options: &WhenReadyOptions,
    ) -> WatsonResult<Value> {
        required(&[("customization_id", customization_id)])?;
        let deadline = Instant::now().checked_add(options.timeout);

        loop {
            let customization = self.get_customization(customization_id).await?;
            let status = customization
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default();

            debug!(customization_id = customization_id, status = status, "Polled customization");

            match status {
                "ready" | "available" => return Ok(customization),
                "failed" => {
                    let detail = customization
                        .get("warnings")
                        .and_then(Value::as_str)
                        .unwrap_or("training failed")
                        .to_string();
                    return Err(WatsonError::CustomizationFailed {
                        customization_id: customization_id.to_string(),
                        detail,
                    });
                }
                _ => {}
            }

            let next_poll = Instant::now().checked_add(options.interval);
            if let Some(deadline) = deadline
                && next_poll.is_none_or(|next| next > deadline)
            {
                return Err(WatsonError::Timeout(format!(
                    "Customization {customization_id} not ready after {} seconds",
                    options.timeout.as_secs()
                )));
            }
            sleep(options.interval).await;
        }
    }
}
