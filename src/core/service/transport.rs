use async_trait::async_trait;

use crate::errors::WatsonResult;

/// Executes a fully prepared HTTP request.
///
/// `reqwest::Client` is the production implementation. Tests plug in a
/// transport that records the request instead of sending it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: reqwest::Request) -> WatsonResult<reqwest::Response>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn execute(&self, request: reqwest::Request) -> WatsonResult<reqwest::Response> {
        Ok(reqwest::Client::execute(self, request).await?)
    }
}
