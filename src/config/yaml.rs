use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// conversation:
///   username: "conversation-user"
///   password: "conversation-pass"
///   version_date: "2017-05-26"
///
/// discovery:
///   url: "https://gateway.watsonplatform.net/discovery/api"
///   username: "discovery-user"
///   password: "discovery-pass"
///   version_date: "2017-08-01"
///
/// speech_to_text:
///   token: "pre-obtained-token"
///   learning_opt_out: true
///   timeout_secs: 300
///   headers:
///     X-Custom: "value"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub conversation: Option<ServiceYaml>,
    pub discovery: Option<ServiceYaml>,
    pub speech_to_text: Option<ServiceYaml>,
}

/// One service section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceYaml {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub version_date: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub use_unauthenticated: Option<bool>,
    pub learning_opt_out: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
