//! Saved prompt context, keyed by the session id embedded in callback ids.
//!
//! A confirmation click arrives as a new invocation that knows nothing
//! about the command that prompted it. Whatever the prompt needs to finish
//! its work is saved here when the prompt is issued and taken back when
//! the user clicks.
//!
//! Entries expire after the configured TTL. Taking an entry removes it, so
//! a second click on the same prompt sees [`CommandInputError::SessionExpired`].

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use slack_bud_core::{CommandInputError, SessionId};
use tracing::{debug, instrument, warn};

/// Upper bound on concurrently open prompts.
const MAX_OPEN_SESSIONS: u64 = 10_000;

/// Context saved alongside a confirmation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Command that issued the prompt.
    pub command: String,
    /// Sub-command that issued the prompt, in token form.
    pub sub_command: Option<String>,
    /// Slack id of the prompted user.
    pub user_id: Option<String>,
    /// Name of the prompted user.
    pub user_name: Option<String>,
    /// Text of the prompt message.
    pub original_text: String,
    /// Handler parameters to restore on confirmation.
    pub params: BTreeMap<String, serde_json::Value>,
    /// When the prompt was issued.
    pub created_at: DateTime<Utc>,
}

/// In-process session store with TTL expiry.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<SessionId, SessionRecord>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl SessionStore {
    /// Create a store whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_OPEN_SESSIONS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Save a record under a fresh session id.
    #[instrument(skip(self, record), fields(cmd = %record.command))]
    pub async fn store(&self, record: SessionRecord) -> SessionId {
        let id = SessionId::generate();
        self.cache.insert(id.clone(), record).await;
        debug!(session_id = %id, "Stored prompt session");
        id
    }

    /// Read a record without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::SessionExpired`] if the id is unknown or
    /// has expired.
    pub async fn get(&self, id: &SessionId) -> Result<SessionRecord, CommandInputError> {
        self.cache
            .get(id)
            .await
            .ok_or_else(|| CommandInputError::SessionExpired(id.to_string()))
    }

    /// Remove and return a record.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::SessionExpired`] if the id is unknown,
    /// has expired or was already taken.
    #[instrument(skip(self))]
    pub async fn take(&self, id: &SessionId) -> Result<SessionRecord, CommandInputError> {
        match self.cache.remove(id).await {
            Some(record) => {
                debug!(session_id = %id, "Took prompt session");
                Ok(record)
            }
            None => {
                warn!(session_id = %id, "Confirmation for unknown or expired session");
                Err(CommandInputError::SessionExpired(id.to_string()))
            }
        }
    }
}
