//! Slack ingress routes.
//!
//! Slash commands and button clicks are verified, parsed into a
//! [`CommandInput`] and acknowledged immediately. The work itself runs on
//! the [`worker`](crate::worker), which posts the result to the
//! invocation's `response_url`.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use slack_bud_core::{CommandInput, ExecutionLocation, ParamBag, classify, wire};
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::slack::{SIGNATURE_HEADER, SlackResponse, TIMESTAMP_HEADER, build_ack_response};
use crate::state::AppState;
use crate::worker;

/// Create the bot's routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/slack/commands", post(handle_command))
        .route("/slack/interactions", post(handle_interaction))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Handle a slash command.
#[instrument(skip(state, headers, body))]
async fn handle_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<SlackResponse>, AppError> {
    let bag = verified_params(&state, &headers, &body)?;
    accept(&state, &bag)
}

/// Handle a button click on a confirmation prompt.
#[instrument(skip(state, headers, body))]
async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<SlackResponse>, AppError> {
    let bag = verified_params(&state, &headers, &body)?;
    if !classify(&bag) {
        return Err(AppError::BadRequest("Missing payload".into()));
    }
    accept(&state, &bag)
}

/// Verify the Slack signature and decode the form body.
fn verified_params(
    state: &AppState,
    headers: &HeaderMap,
    body: &str,
) -> Result<ParamBag, AppError> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing timestamp header".into()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".into()))?;

    state
        .verifier()
        .verify(timestamp, body, signature)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    Ok(ParamBag::from_form(body))
}

/// Parse the invocation, hand it to the worker and acknowledge it.
fn accept(state: &AppState, bag: &ParamBag) -> Result<Json<SlackResponse>, AppError> {
    let mut input = CommandInput::from_params(bag, state.config().environment.clone())?;
    input.set_execution_location(ExecutionLocation::Sync)?;

    let record = wire::to_json(&input)?;
    debug!(bytes = record.len(), "Encoded invocation for worker");

    info!(
        cmd = ?input.command(),
        user = ?input.user_name(),
        confirmation = input.is_confirmation(),
        "Accepted invocation"
    );
    worker::spawn(state.clone(), record);

    Ok(Json(build_ack_response(&input)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;
    use crate::config::BotConfig;
    use crate::dispatch::Dispatcher;
    use crate::slack::{ResponseSink, SignatureVerifier, SlackError};

    const SIGNING_SECRET: &str = "8f74b2c1e9d05a3f6b7c48e2d1a9f0c3";

    struct ChannelSink(mpsc::UnboundedSender<(String, SlackResponse)>);

    #[async_trait]
    impl ResponseSink for ChannelSink {
        async fn send(&self, target: &str, response: &SlackResponse) -> Result<(), SlackError> {
            self.0
                .send((target.to_string(), response.clone()))
                .map_err(|e| SlackError::Request(e.to_string()))
        }
    }

    fn app() -> (Router, mpsc::UnboundedReceiver<(String, SlackResponse)>) {
        let config = BotConfig::from_lookup(|key| {
            (key == "SLACK_SIGNING_SECRET").then(|| SIGNING_SECRET.to_string())
        })
        .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::with_parts(
            config,
            Dispatcher::builder().build(),
            Arc::new(ChannelSink(tx)),
        );
        (router().with_state(state), rx)
    }

    fn now() -> String {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string()
    }

    fn signed_request(uri: &str, body: &str) -> Request<Body> {
        let timestamp = now();
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

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _rx) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_command_is_acked_then_answered() {
        let (app, mut rx) = app();
        let body = "text=help&user_id=U1&user_name=jane&response_url=https%3A%2F%2Fhooks.example%2F1";

        let response = app
            .oneshot(signed_request("/slack/commands", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = json_body(response).await;
        assert_eq!(ack["response_type"], "ephemeral");
        assert_eq!(ack["text"], "Working on `help`...");

        let (target, reply) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target, "https://hooks.example/1");
        assert!(reply.text.starts_with("*Commands*"));
    }

    #[tokio::test]
    async fn test_unknown_command_answered_with_error() {
        let (app, mut rx) = app();
        let body = "text=deploy+prod&response_url=https%3A%2F%2Fhooks.example%2F2";

        app.oneshot(signed_request("/slack/commands", body))
            .await
            .unwrap();

        let (_, reply) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(reply.is_ephemeral());
        assert!(reply.text.contains("Unknown command `deploy`"));
    }

    #[tokio::test]
    async fn test_unbalanced_quotes_rejected_synchronously() {
        let (app, _rx) = app();
        let body = "text=props+set+%22oops";

        let response = app
            .oneshot(signed_request("/slack/commands", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["text"].as_str().unwrap().contains("unterminated quote"));
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let (app, _rx) = app();
        let request = Request::post("/slack/commands")
            .header(TIMESTAMP_HEADER, now())
            .header(SIGNATURE_HEADER, "v0=deadbeef")
            .body(Body::from("text=help"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_headers_rejected() {
        let (app, _rx) = app();
        let request = Request::post("/slack/commands")
            .body(Body::from("text=help"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_interaction_without_payload_rejected() {
        let (app, _rx) = app();
        let response = app
            .oneshot(signed_request("/slack/interactions", "text=help"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
