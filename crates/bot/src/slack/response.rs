//! Posting follow-up messages to a `response_url`.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::error::SlackError;
use super::types::SlackResponse;

/// Destination for follow-up messages, keyed by response target.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Deliver `response` to `target`.
    ///
    /// # Errors
    ///
    /// Returns error if the message could not be delivered.
    async fn send(&self, target: &str, response: &SlackResponse) -> Result<(), SlackError>;
}

/// Posts responses to Slack `response_url`s over HTTP.
#[derive(Debug, Clone, Default)]
pub struct ResponseChannel {
    client: Client,
}

impl ResponseChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseSink for ResponseChannel {
    #[instrument(skip(self, response), fields(response_type = ?response.response_type))]
    async fn send(&self, target: &str, response: &SlackResponse) -> Result<(), SlackError> {
        let reply = self
            .client
            .post(target)
            .json(response)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        if !reply.status().is_success() {
            let status = reply.status();
            let body = reply.text().await.unwrap_or_default();
            return Err(SlackError::Response(format!(
                "Response URL returned {status}: {body}"
            )));
        }

        debug!("Responded to Slack response_url");

        Ok(())
    }
}
