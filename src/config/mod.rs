//! Configuration for the Watson service clients.
//!
//! Each service (Conversation, Discovery, Speech-to-Text) is configured by a
//! [`ServiceConfig`]. Values come from several sources, highest priority
//! first:
//!
//! 1. YAML file values (see [`yaml::YamlConfig`])
//! 2. Environment variables (`CONVERSATION_USERNAME`, `DISCOVERY_URL`, ...)
//! 3. `.env` file values (loaded by [`SdkConfig::from_file`] / the CLI)
//! 4. Cloud Foundry `VCAP_SERVICES` credentials
//! 5. Defaults (public service URLs)
//!
//! # Example
//! ```rust,no_run
//! use watson_sdk::config::{SdkConfig, ServiceConfig};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Environment only
//! let config = SdkConfig::from_env()?;
//!
//! // YAML with environment fallback
//! let config = SdkConfig::from_file(&PathBuf::from("watson.yaml"))?;
//!
//! // Built in code
//! let stt = ServiceConfig::new("https://stream.watsonplatform.net/speech-to-text/api")
//!     .with_basic_auth("username", "password");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::errors::{WatsonError, WatsonResult};

pub mod yaml;

pub use yaml::{ServiceYaml, YamlConfig};

/// TCP connect timeout for the HTTP client. No overall request timeout is set
/// by default because recognition of long audio can take minutes.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// The Watson services covered by this SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Conversation,
    Discovery,
    SpeechToText,
}

impl ServiceKind {
    /// Public endpoint used when no URL is configured.
    pub fn default_url(&self) -> &'static str {
        match self {
            Self::Conversation => "https://gateway.watsonplatform.net/conversation/api",
            Self::Discovery => "https://gateway.watsonplatform.net/discovery/api",
            Self::SpeechToText => "https://stream.watsonplatform.net/speech-to-text/api",
        }
    }

    /// Prefix of the environment variables read for this service.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Conversation => "CONVERSATION",
            Self::Discovery => "DISCOVERY",
            Self::SpeechToText => "SPEECH_TO_TEXT",
        }
    }

    /// Service label used in Cloud Foundry's `VCAP_SERVICES`.
    pub fn vcap_name(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Discovery => "discovery",
            Self::SpeechToText => "speech_to_text",
        }
    }

    /// Whether calls carry a `version=<date>` query parameter.
    pub fn requires_version_date(&self) -> bool {
        matches!(self, Self::Conversation | Self::Discovery)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conversation => write!(f, "conversation"),
            Self::Discovery => write!(f, "discovery"),
            Self::SpeechToText => write!(f, "speech-to-text"),
        }
    }
}

/// Connection settings for one Watson service.
///
/// Secrets are held in [`Zeroizing`] buffers and wiped when dropped.
#[derive(Clone, Default)]
pub struct ServiceConfig {
    /// Base service URL, e.g. `https://gateway.watsonplatform.net/discovery/api`.
    pub url: Option<String>,
    /// HTTP Basic username.
    pub username: Option<String>,
    /// HTTP Basic password.
    pub password: Option<Zeroizing<String>>,
    /// Pre-obtained bearer token. Never refreshed by the SDK.
    pub token: Option<Zeroizing<String>>,
    /// API version date (`YYYY-MM-DD`), sent as the `version` query parameter.
    pub version_date: Option<String>,
    /// Extra headers added to every request.
    pub headers: HashMap<String, String>,
    /// Skip the credential check (for proxies that inject credentials).
    pub use_unauthenticated: bool,
    /// Send `X-Watson-Learning-Opt-Out: true` on every request.
    pub learning_opt_out: bool,
    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("version_date", &self.version_date)
            .field("headers", &self.headers)
            .field("use_unauthenticated", &self.use_unauthenticated)
            .field("learning_opt_out", &self.learning_opt_out)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Zeroizing::new(token.into()));
        self
    }

    pub fn with_version_date(mut self, version_date: impl Into<String>) -> Self {
        self.version_date = Some(version_date.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn unauthenticated(mut self) -> Self {
        self.use_unauthenticated = true;
        self
    }

    /// Configured URL or the public default for `kind`.
    pub fn url_or_default(&self, kind: ServiceKind) -> &str {
        self.url.as_deref().unwrap_or(kind.default_url())
    }

    /// Whether enough credentials are present to authenticate.
    pub fn has_credentials(&self) -> bool {
        let basic = self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.as_ref().is_some_and(|p| !p.is_empty());
        let token = self.token.as_ref().is_some_and(|t| !t.is_empty());
        basic || token
    }

    /// Check the settings a client for `kind` needs before it is constructed.
    pub fn validate(&self, kind: ServiceKind) -> WatsonResult<()> {
        if kind.requires_version_date()
            && self.version_date.as_deref().is_none_or(str::is_empty)
        {
            return Err(WatsonError::Configuration(format!(
                "version_date was not specified for the {kind} service, use e.g. version_date: \"{}\"",
                match kind {
                    ServiceKind::Conversation => crate::core::conversation::VERSION_DATE_2017_05_26,
                    _ => crate::core::discovery::VERSION_DATE_2017_08_01,
                }
            )));
        }

        if !self.use_unauthenticated && !self.has_credentials() {
            return Err(WatsonError::InsufficientCredentials);
        }

        if let Some(url) = &self.url {
            url::Url::parse(url)?;
        }

        Ok(())
    }

    /// Load settings for `kind` from the process environment.
    pub fn from_env(kind: ServiceKind) -> Self {
        Self::from_lookup(kind, |name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    ///
    /// `{PREFIX}_URL`, `{PREFIX}_USERNAME`, `{PREFIX}_PASSWORD`, `{PREFIX}_TOKEN`
    /// and `{PREFIX}_VERSION_DATE` take precedence over credentials found in
    /// `VCAP_SERVICES`.
    pub fn from_lookup<F>(kind: ServiceKind, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = kind.env_prefix();
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());

        let mut config = lookup("VCAP_SERVICES")
            .and_then(|raw| vcap_credentials(&raw, kind.vcap_name()))
            .unwrap_or_default();

        if let Some(url) = var("URL") {
            config.url = Some(url);
        }
        if let Some(username) = var("USERNAME") {
            config.username = Some(username);
        }
        if let Some(password) = var("PASSWORD") {
            config.password = Some(Zeroizing::new(password));
        }
        if let Some(token) = var("TOKEN") {
            config.token = Some(Zeroizing::new(token));
        }
        if let Some(version_date) = var("VERSION_DATE") {
            config.version_date = Some(version_date);
        }
        if let Some(opt_out) = var("LEARNING_OPT_OUT") {
            config.learning_opt_out = matches!(opt_out.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        debug!(
            service = %kind,
            url = config.url.as_deref().unwrap_or(kind.default_url()),
            has_credentials = config.has_credentials(),
            "Loaded service configuration from environment"
        );

        config
    }

    /// Apply YAML overrides on top of this configuration.
    pub fn merge_yaml(&mut self, yaml: &ServiceYaml) {
        if let Some(url) = &yaml.url {
            self.url = Some(url.clone());
        }
        if let Some(username) = &yaml.username {
            self.username = Some(username.clone());
        }
        if let Some(password) = &yaml.password {
            self.password = Some(Zeroizing::new(password.clone()));
        }
        if let Some(token) = &yaml.token {
            self.token = Some(Zeroizing::new(token.clone()));
        }
        if let Some(version_date) = &yaml.version_date {
            self.version_date = Some(version_date.clone());
        }
        if let Some(headers) = &yaml.headers {
            self.headers.extend(headers.clone());
        }
        if let Some(flag) = yaml.use_unauthenticated {
            self.use_unauthenticated = flag;
        }
        if let Some(flag) = yaml.learning_opt_out {
            self.learning_opt_out = flag;
        }
        if let Some(secs) = yaml.timeout_secs {
            self.timeout_secs = Some(secs);
        }
    }
}

/// Extract credentials for `service` from a `VCAP_SERVICES` document.
///
/// The first entry whose key starts with the service label wins, which also
/// matches labels such as `speech_to_text-beta`.
pub(crate) fn vcap_credentials(raw: &str, service: &str) -> Option<ServiceConfig> {
    let vcap: Value = serde_json::from_str(raw).ok()?;
    let credentials = vcap
        .as_object()?
        .iter()
        .find(|(label, _)| label.starts_with(service))
        .and_then(|(_, entries)| entries.as_array()?.first())
        .and_then(|entry| entry.get("credentials"))?;

    let field = |name: &str| credentials.get(name).and_then(Value::as_str).map(str::to_string);

    Some(ServiceConfig {
        url: field("url"),
        username: field("username"),
        password: field("password").map(Zeroizing::new),
        ..Default::default()
    })
}

/// Configuration for all three services.
#[derive(Debug, Clone, Default)]
pub struct SdkConfig {
    pub conversation: ServiceConfig,
    pub discovery: ServiceConfig,
    pub speech_to_text: ServiceConfig,
}

impl SdkConfig {
    /// Load every service from environment variables.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            conversation: ServiceConfig::from_env(ServiceKind::Conversation),
            discovery: ServiceConfig::from_env(ServiceKind::Discovery),
            speech_to_text: ServiceConfig::from_env(ServiceKind::SpeechToText),
        })
    }

    /// Load `.env`, then environment variables, then apply YAML overrides.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let _ = dotenvy::dotenv();

        let yaml = YamlConfig::from_file(path)?;
        let mut config = Self::from_env()?;
        config.apply_yaml(&yaml);
        Ok(config)
    }

    /// Apply all sections present in `yaml`.
    pub fn apply_yaml(&mut self, yaml: &YamlConfig) {
        if let Some(section) = &yaml.conversation {
            self.conversation.merge_yaml(section);
        }
        if let Some(section) = &yaml.discovery {
            self.discovery.merge_yaml(section);
        }
        if let Some(section) = &yaml.speech_to_text {
            self.speech_to_text.merge_yaml(section);
        }
    }

    pub fn service(&self, kind: ServiceKind) -> &ServiceConfig {
        match kind {
            ServiceKind::Conversation => &self.conversation,
            ServiceKind::Discovery => &self.discovery,
            ServiceKind::SpeechToText => &self.speech_to_text,
        }
    }
}
