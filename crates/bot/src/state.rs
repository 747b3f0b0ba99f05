//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BotConfig;
use crate::dispatch::Dispatcher;
use crate::session::SessionStore;
use crate::slack::{ResponseChannel, ResponseSink, SignatureVerifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BotConfig,
    dispatcher: Dispatcher,
    sessions: SessionStore,
    responses: Arc<dyn ResponseSink>,
    verifier: SignatureVerifier,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .field("sessions", &self.inner.sessions)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state that posts follow-ups to Slack over HTTP.
    #[must_use]
    pub fn new(config: BotConfig, dispatcher: Dispatcher) -> Self {
        Self::with_parts(config, dispatcher, Arc::new(ResponseChannel::new()))
    }

    /// Build state around an arbitrary response sink.
    #[must_use]
    pub fn with_parts(
        config: BotConfig,
        dispatcher: Dispatcher,
        responses: Arc<dyn ResponseSink>,
    ) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        let verifier = SignatureVerifier::new(config.signing_secret.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                dispatcher,
                sessions,
                responses,
                verifier,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    #[must_use]
    pub fn responses(&self) -> &dyn ResponseSink {
        self.inner.responses.as_ref()
    }

    #[must_use]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.inner.verifier
    }
}
