//! Watson Discovery v1.
//!
//! Environments hold configurations and collections; documents are uploaded
//! into collections and searched with [`Discovery::query`].
//!
//! ```rust,no_run
//! use watson_sdk::config::ServiceConfig;
//! use watson_sdk::core::discovery::{Discovery, QueryParams, VERSION_DATE_2017_08_01};
//!
//! # async fn run() -> watson_sdk::WatsonResult<()> {
//! let discovery = Discovery::new(
//!     ServiceConfig::default()
//!         .with_basic_auth("username", "password")
//!         .with_version_date(VERSION_DATE_2017_08_01),
//! )?;
//!
//! let results = discovery
//!     .query(&QueryParams {
//!         environment_id: "env-guid".into(),
//!         collection_id: "col-guid".into(),
//!         natural_language_query: Some("IBM Watson partnerships".into()),
//!         count: Some(10),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", results["matching_results"]);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod params;

#[cfg(test)]
mod tests;

pub use client::Discovery;
pub use params::*;

pub const VERSION_DATE_2016_12_01: &str = "2016-12-01";
pub const VERSION_DATE_2016_12_15: &str = "2016-12-15";
pub const VERSION_DATE_2017_06_25: &str = "2017-06-25";
pub const VERSION_DATE_2017_07_19: &str = "2017-07-19";
pub const VERSION_DATE_2017_08_01: &str = "2017-08-01";
pub const VERSION_DATE_2017_09_01: &str = "2017-09-01";
