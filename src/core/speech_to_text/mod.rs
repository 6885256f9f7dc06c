//! Watson Speech-to-Text v1.
//!
//! Four ways to get audio recognized:
//!
//! - **Sessionless**: [`SpeechToText::recognize`] posts a whole file or buffer.
//! - **Sessions**: [`SpeechToText::create_session`] pins a recognition engine
//!   and returns the `SESSIONID` cookie as `cookie_session`. Audio is then
//!   posted with `recognize` (with `session_id`) or uploaded chunk by chunk
//!   with [`SpeechToText::recognize_live`], while
//!   [`SpeechToText::observe_result`] long-polls for interim results.
//! - **WebSocket**: [`SpeechToText::recognize_stream`] opens a duplex
//!   [`RecognizeStream`]: audio in, [`RecognizeEvent`]s out.
//! - **Asynchronous jobs**: [`SpeechToText::register_callback`] whitelists a
//!   callback URL, [`SpeechToText::create_recognition_job`] submits audio,
//!   and results are pushed to the callback or fetched with
//!   [`SpeechToText::get_recognition_job`].
//!
//! Custom language models (customizations, corpora, words) are managed with
//! the `*_customization`, `*_corpus` and `*_word(s)` methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use watson_sdk::config::ServiceConfig;
//! use watson_sdk::core::speech_to_text::{RecognizeParams, SpeechToText};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stt = SpeechToText::new(
//!         ServiceConfig::default().with_basic_auth("username", "password"),
//!     )?;
//!
//!     let results = stt
//!         .recognize(&RecognizeParams {
//!             audio: PathBuf::from("weather.wav").into(),
//!             content_type: "audio/wav".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("{results:#}");
//!     Ok(())
//! }
//! ```
//!
//! # References
//!
//! - [Speech to Text API reference](https://www.ibm.com/watson/developercloud/speech-to-text/api/v1/)

mod client;
pub mod config;
mod live;
pub mod messages;
mod stream;


pub use client::SpeechToText;
pub use config::{
    AddCorpusParams, AddWordParams, AddWordsParams, AudioSource, CreateCustomizationParams,
    CreateRecognitionJobParams, CreateSessionParams, CustomWord, DEFAULT_MODEL, GetWordsParams,
    ObserveResultParams, RecognitionOptions, RecognizeLiveParams, RecognizeParams,
    RecognizeStreamParams, RegisterCallbackParams, SESSION_COOKIE, SessionParams,
    TrainCustomizationParams, WhenReadyOptions,
};
pub use live::LiveRecognition;
pub use messages::{Alternative, RecognitionResult, ResultsMessage, Session, SpeakerLabel, WordTiming};
pub use stream::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_LISTENING_TIMEOUT, RecognizeEvent, RecognizeStream};
