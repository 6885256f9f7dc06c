//! Speech-to-Text message types.
//!
//! Frames exchanged over the recognize WebSocket, and the few REST responses
//! the SDK inspects instead of passing through as JSON.

use serde::{Deserialize, Serialize};

/// Text frame that ends the audio of a recognize request.
pub(crate) const STOP_ACTION: &str = r#"{"action":"stop"}"#;

/// Text frame received on the recognize WebSocket.
///
/// Variants are tried in order; a frame matching none of them fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecognizeMessage {
    Results(ResultsMessage),
    SpeakerLabels(SpeakerLabelsMessage),
    /// `{"state": "listening"}`: sent once the start message is accepted, and
    /// again when every byte before a stop has been recognized.
    State(StateMessage),
    /// Usually followed by the service closing the socket.
    Error(ErrorMessage),
}

impl RecognizeMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::State(state) if state.is_listening())
    }
}

// =============================================================================
// Results
// =============================================================================

/// One batch of results, starting at `result_index` of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsMessage {
    pub results: Vec<RecognitionResult>,
    #[serde(default)]
    pub result_index: i32,
    /// Present when `speaker_labels` was requested and labels arrive in the
    /// same frame as the words they describe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_labels: Option<Vec<SpeakerLabel>>,
}

impl ResultsMessage {
    /// Best transcript of every final result in this message.
    pub fn final_transcripts(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.is_final)
            .filter_map(RecognitionResult::transcript)
            .map(str::to_string)
            .collect()
    }

    pub fn has_final(&self) -> bool {
        self.results.iter().any(|r| r.is_final)
    }
}

/// A recognized utterance. Interim results may still change; final ones won't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(rename = "final")]
    pub is_final: bool,
    /// Hypotheses, best first.
    pub alternatives: Vec<Alternative>,
    /// Spotted keywords, keyed by the requested keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords_result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_alternatives: Option<Vec<WordAlternativeSet>>,
}

impl RecognitionResult {
    pub fn best(&self) -> Option<&Alternative> {
        self.alternatives.first()
    }

    /// Best transcript with the service's trailing space trimmed.
    pub fn transcript(&self) -> Option<&str> {
        self.best().map(|alt| alt.transcript.trim())
    }

    /// `(word, start, end)` of the best hypothesis; empty unless `timestamps`
    /// was requested.
    pub fn word_timings(&self) -> &[WordTiming] {
        self.best()
            .and_then(|alt| alt.timestamps.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    /// Only reported on final results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<WordTiming>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_confidence: Option<Vec<WordScore>>,
}

/// Sent as `["word", start_secs, end_secs]`.
pub type WordTiming = (String, f64, f64);

/// Sent as `["word", confidence]`.
pub type WordScore = (String, f64);

/// Competing words for one time span, reported when
/// `word_alternatives_threshold` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAlternativeSet {
    pub start_time: f64,
    pub end_time: f64,
    pub alternatives: Vec<WordHypothesis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordHypothesis {
    pub word: String,
    pub confidence: f64,
}

// =============================================================================
// State, speaker labels, errors
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMessage {
    pub state: String,
}

impl StateMessage {
    pub fn is_listening(&self) -> bool {
        self.state == "listening"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerLabelsMessage {
    pub speaker_labels: Vec<SpeakerLabel>,
}

/// Who spoke between `from` and `to` (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerLabel {
    pub from: f64,
    pub to: f64,
    pub speaker: i32,
    pub confidence: f64,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl ErrorMessage {
    /// The service gave up waiting for speech (`inactivity_timeout`).
    pub fn is_inactivity(&self) -> bool {
        self.code == Some(408)
            || self.error.contains("inactivity")
            || self.error.contains("No speech detected")
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Response of `create_session`.
///
/// `cookie_session` is not part of the JSON body; it is filled from the
/// `SESSIONID` cookie of the response and must be replayed on later calls
/// that reach the same session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub new_session_uri: Option<String>,
    #[serde(default)]
    pub recognize: Option<String>,
    #[serde(default)]
    pub observe_result: Option<String>,
    #[serde(rename = "recognizeWS", default, skip_serializing_if = "Option::is_none")]
    pub recognize_ws: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_session: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
