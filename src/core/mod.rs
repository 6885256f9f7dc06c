pub mod conversation;
pub mod discovery;
pub mod service;
pub mod speech_to_text;

// Re-export commonly used types for convenience
pub use conversation::Conversation;
pub use discovery::Discovery;
pub use service::{ApiRequest, HttpTransport, RequestBody, WatsonService};
pub use speech_to_text::{
    AudioSource, LiveRecognition, RecognizeEvent, RecognizeStream, RecognizeStreamParams,
    SpeechToText,
};
