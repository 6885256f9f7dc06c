//! Test transport that records requests and replays canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use url::Url;

use super::{HttpTransport, WatsonService};
use crate::config::{ServiceConfig, ServiceKind};
use crate::errors::WatsonResult;

pub(crate) const TEST_URL: &str = "http://ibm.com:80";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: reqwest::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    /// Path plus query, e.g. `/v1/recognize?continuous=true`.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{q}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .map(|b| serde_json::from_slice(b).unwrap())
            .unwrap_or(serde_json::Value::Null)
    }
}

pub(crate) struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<CannedResponse>>,
}

impl RecordingTransport {
    pub fn reply(&self, status: u16, body: impl Into<String>) {
        self.reply_with_headers(status, &[], body);
    }

    pub fn reply_with_headers(&self, status: u16, headers: &[(&str, &str)], body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(CannedResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.into(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: reqwest::Request) -> WatsonResult<reqwest::Response> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request.body().and_then(|b| b.as_bytes()).map(<[u8]>::to_vec),
        });

        let canned = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CannedResponse {
                status: 200,
                headers: vec![],
                body: "{}".to_string(),
            });

        let mut builder = http::Response::builder().status(canned.status);
        for (name, value) in &canned.headers {
            builder = builder.header(name, value);
        }
        Ok(reqwest::Response::from(builder.body(canned.body).unwrap()))
    }
}

pub(crate) fn test_config(kind: ServiceKind) -> ServiceConfig {
    let config = ServiceConfig::new(TEST_URL).with_basic_auth("batman", "bruce-wayne");
    match kind {
        ServiceKind::Conversation => config.with_version_date("2017-05-26"),
        ServiceKind::Discovery => config.with_version_date("2016-12-15"),
        ServiceKind::SpeechToText => config,
    }
}

pub(crate) fn recording_service(kind: ServiceKind) -> (WatsonService, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let service = WatsonService::new(kind, test_config(kind))
        .unwrap()
        .with_transport(transport.clone());
    (service, transport)
}
