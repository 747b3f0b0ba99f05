//! Integration tests for Slack Bud.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p slack-bud-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `protocol_*` - Core protocol across crate boundaries
//! - `bot_*` - The bot's HTTP surface, driven in-process
//!
//! This library holds the shared fixtures: a signed-request builder, a
//! response sink that records follow-ups, and a `props` command that
//! prompts before changing anything.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use secrecy::SecretString;
use serde_json::json;
use slack_bud_bot::config::BotConfig;
use slack_bud_bot::dispatch::{
    CommandHandler, ConfirmationPrompt, DispatchError, Dispatcher, HandlerOutcome,
};
use slack_bud_bot::routes;
use slack_bud_bot::session::SessionRecord;
use slack_bud_bot::slack::{
    ResponseSink, SIGNATURE_HEADER, SignatureVerifier, SlackError, SlackResponse, TIMESTAMP_HEADER,
};
use slack_bud_bot::state::AppState;
use slack_bud_core::{CommandInput, SubCommand, Switch, SwitchSchema};
use tokio::sync::{Mutex, mpsc};

/// Signing secret shared by the test bot and the request builder.
pub const SIGNING_SECRET: &str = "3c9e1f7a0b5d24e8f6a1c7b3d9e05f2a";

/// How long tests wait for the worker to post a follow-up.
pub const FOLLOW_UP_TIMEOUT: Duration = Duration::from_secs(5);

/// One follow-up message posted by the worker.
pub type FollowUp = (String, SlackResponse);

/// Sink recording every follow-up on a channel.
#[derive(Debug)]
pub struct RecordingSink(mpsc::UnboundedSender<FollowUp>);

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn send(&self, target: &str, response: &SlackResponse) -> Result<(), SlackError> {
        self.0
            .send((target.to_string(), response.clone()))
            .map_err(|e| SlackError::Request(e.to_string()))
    }
}

/// A bot under test and the follow-ups it posts.
pub struct TestBot {
    pub app: Router,
    follow_ups: Mutex<mpsc::UnboundedReceiver<FollowUp>>,
}

impl TestBot {
    /// Start a bot serving `props` in environment `env`.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new(env: &str) -> Self {
        let env = env.to_string();
        let config = BotConfig::from_lookup(move |key| match key {
            "SLACK_SIGNING_SECRET" => Some(SIGNING_SECRET.to_string()),
            "SLACK_BUD_ENV" => Some(env.clone()),
            "SESSION_TTL_SECS" => Some("60".to_string()),
            _ => None,
        })
        .unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::with_parts(
            config,
            Dispatcher::builder().register(PropsHandler).build(),
            Arc::new(RecordingSink(tx)),
        );

        Self {
            app: routes::router().with_state(state),
            follow_ups: Mutex::new(rx),
        }
    }

    /// Wait for the next follow-up.
    ///
    /// # Panics
    ///
    /// Panics if nothing is posted within [`FOLLOW_UP_TIMEOUT`].
    #[allow(clippy::expect_used)]
    pub async fn next_follow_up(&self) -> FollowUp {
        let mut rx = self.follow_ups.lock().await;
        tokio::time::timeout(FOLLOW_UP_TIMEOUT, rx.recv())
            .await
            .expect("worker posted nothing")
            .expect("sink closed")
    }
}

/// Build a request signed with [`SIGNING_SECRET`].
///
/// # Panics
///
/// Panics if the clock is before the Unix epoch.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn signed_request(uri: &str, body: &str) -> Request<Body> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string();
    let signature = SignatureVerifier::new(SecretString::from(SIGNING_SECRET))
        .sign(&timestamp, body)
        .unwrap();

    Request::post(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Form-encode `pairs`.
#[must_use]
pub fn form(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// `props list|set <key> <value> -s <service>`.
///
/// `set` prompts first; confirming echoes the saved key, value and
/// service back to the channel.
#[derive(Debug, Clone, Copy)]
pub struct PropsHandler;

#[async_trait]
impl CommandHandler for PropsHandler {
    fn name(&self) -> &'static str {
        "props"
    }

    fn description(&self) -> &'static str {
        "Read and change service properties"
    }

    fn sub_commands(&self) -> &'static [&'static str] {
        &["list", "set"]
    }

    fn schema(&self, _sub_command: Option<&SubCommand>) -> SwitchSchema {
        SwitchSchema::new()
            .with(Switch::value("service").alias('s').required())
            .with(Switch::value("env").alias('e').default_value("dev"))
    }

    async fn handle(&self, input: &mut CommandInput) -> Result<HandlerOutcome, DispatchError> {
        let service = input.by_key("service").unwrap_or_default().to_string();

        if input.sub_command() != Some(&SubCommand::named("set")) {
            return Ok(HandlerOutcome::Reply(format!("No properties set on {service}")));
        }

        let key = input
            .by_index(2)
            .ok_or_else(|| DispatchError::Handler("Usage: props set <key> <value>".into()))?
            .to_string();
        let value = input.by_index(3).unwrap_or_default().to_string();

        Ok(HandlerOutcome::Prompt(
            ConfirmationPrompt::new(format!("Set {key} to \"{value}\" on {service}?"), "confirm")
                .with_detail(format!("environment: {}", input.environment()))
                .with_param("key", json!(key))
                .with_param("value", json!(value))
                .with_param("service", json!(service)),
        ))
    }

    async fn confirm(
        &self,
        input: &mut CommandInput,
        session: SessionRecord,
    ) -> Result<HandlerOutcome, DispatchError> {
        let params = input.confirmation_params();
        let field = |name: &str| {
            params
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Ok(HandlerOutcome::PublicReply(format!(
            "{} set {}={} on {}",
            session.user_name.unwrap_or_else(|| "someone".to_string()),
            field("key"),
            field("value"),
            field("service"),
        )))
    }
}
