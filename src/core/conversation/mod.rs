//! Watson Conversation v1.
//!
//! Dialog turns are sent with [`Conversation::message`]; workspaces and their
//! intents, examples, counterexamples, entities and values are managed with
//! the remaining methods. Every call carries `version=<version_date>`.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use watson_sdk::config::ServiceConfig;
//! use watson_sdk::core::conversation::{Conversation, MessageParams, VERSION_DATE_2017_05_26};
//!
//! # async fn run() -> watson_sdk::WatsonResult<()> {
//! let conversation = Conversation::new(
//!     ServiceConfig::default()
//!         .with_basic_auth("username", "password")
//!         .with_version_date(VERSION_DATE_2017_05_26),
//! )?;
//!
//! let response = conversation
//!     .message(&MessageParams {
//!         workspace_id: "9978a49e-ea89-4493-b33d-82298d3db20d".into(),
//!         input: Some(json!({"text": "Turn on the lights"})),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", response["output"]["text"]);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod params;


pub use client::Conversation;
pub use params::*;

pub const VERSION_DATE_2016_07_11: &str = "2016-07-11";
pub const VERSION_DATE_2016_09_20: &str = "2016-09-20";
pub const VERSION_DATE_2017_02_03: &str = "2017-02-03";
pub const VERSION_DATE_2017_04_21: &str = "2017-04-21";
pub const VERSION_DATE_2017_05_26: &str = "2017-05-26";
