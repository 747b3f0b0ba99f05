//! Slack Bud - chat-ops bot.
//!
//! Serves the Slack slash-command and interaction endpoints on port 3002.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Slack request signing for authentication
//! - In-process prompt sessions with TTL expiry
//! - Background worker posting results to `response_url`

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;
use sentry::integrations::tracing as sentry_tracing;
use slack_bud_bot::config::BotConfig;
use slack_bud_bot::dispatch::Dispatcher;
use slack_bud_bot::routes;
use slack_bud_bot::state::AppState;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = BotConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slack_bud_bot=info,tower_http=debug".into());

    // JSON for log shipping, text locally
    let use_json = std::env::var("SLACK_BUD_LOG_JSON").is_ok();
    let json_layer = use_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!use_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    tracing::info!(environment = %config.environment, "Configuration loaded");

    let addr = config.socket_addr();
    let state = AppState::new(config, Dispatcher::builder().build());

    let app: Router = routes::router()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("slack-bud listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
