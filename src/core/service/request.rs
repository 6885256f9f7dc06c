//! Request description shared by every service wrapper.

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::Form;
use serde_json::Value;
use url::Url;

use crate::errors::{WatsonError, WatsonResult};

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Bytes {
        data: Bytes,
        content_type: String,
    },
    /// Streamed body (files, live audio). Sent chunked when the length is unknown.
    Stream {
        body: reqwest::Body,
        content_type: String,
    },
    Multipart(Form),
}

/// A single API call, before base URL, credentials and default headers are applied.
///
/// `path` is a template such as `/v1/workspaces/{workspace_id}/intents/{intent}`.
/// Each `{name}` placeholder is replaced by the matching path parameter,
/// encoded as one path segment.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: &'static str,
    pub path_params: Vec<(&'static str, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

/// Values that can be rendered into a query string.
pub trait QueryValue {
    fn to_query(&self) -> String;
}

impl QueryValue for str {
    fn to_query(&self) -> String {
        self.to_string()
    }
}

impl QueryValue for String {
    fn to_query(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_query_value_display {
    ($($t:ty),*) => {
        $(impl QueryValue for $t {
            fn to_query(&self) -> String {
                self.to_string()
            }
        })*
    };
}

impl_query_value_display!(bool, u8, u16, u32, u64, i32, i64, f32, f64, usize);

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query(&self) -> String {
        (**self).to_query()
    }
}

impl ApiRequest {
    pub fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            path_params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'static str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &'static str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &'static str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn path_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    pub fn query(mut self, name: &str, value: impl QueryValue) -> Self {
        self.query.push((name.to_string(), value.to_query()));
        self
    }

    /// Append `name=value` only when a value is supplied.
    pub fn query_opt<T: QueryValue>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    /// Append a list parameter joined with `,`. Empty or absent lists are skipped.
    pub fn query_list<S: AsRef<str>>(self, name: &str, values: Option<&[S]>) -> Self {
        match values {
            Some(list) if !list.is_empty() => {
                let joined = list.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
                self.query(name, joined)
            }
            _ => self,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn bytes(mut self, data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        };
        self
    }

    pub fn stream(mut self, body: reqwest::Body, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Stream {
            body,
            content_type: content_type.into(),
        };
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Resolve the path template against `base` and append the query string.
    ///
    /// The base URL's own path (e.g. `/speech-to-text/api`) is kept as prefix.
    pub fn build_url(&self, base: &Url) -> WatsonResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| WatsonError::Configuration(format!("{base} cannot be a base URL")))?;
            segments.pop_if_empty();

            for segment in self.path.split('/').filter(|s| !s.is_empty()) {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => {
                        let value = self
                            .path_params
                            .iter()
                            .find(|(n, _)| *n == name)
                            .map(|(_, v)| v.as_str())
                            .ok_or_else(|| WatsonError::MissingParameters(vec![name.to_string()]))?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}

/// Fail with every name whose value is empty.
///
/// ```rust
/// use watson_sdk::core::service::required;
///
/// assert!(required(&[("workspace_id", "abc")]).is_ok());
/// let err = required(&[("environment_id", ""), ("collection_id", "")]).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Missing required parameters: environment_id, collection_id"
/// );
/// ```
pub fn required(params: &[(&str, &str)]) -> WatsonResult<()> {
    let present: Vec<(&str, bool)> = params
        .iter()
        .map(|(name, value)| (*name, !value.trim().is_empty()))
        .collect();
    required_present(&present)
}

/// Like [`required`], for parameters that are not strings (files, lists,
/// JSON documents): each flag says whether the named parameter was supplied.
///
/// ```rust
/// use watson_sdk::core::service::required_present;
///
/// let err = required_present(&[("customization_id", true), ("words", false)]).unwrap_err();
/// assert_eq!(err.to_string(), "Missing required parameters: words");
/// ```
pub fn required_present(params: &[(&str, bool)]) -> WatsonResult<()> {
    let missing: Vec<String> = params
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WatsonError::MissingParameters(missing))
    }
}
