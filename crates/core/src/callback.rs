//! Correlating a confirmation click back to the command that prompted it.
//!
//! A button click only carries a callback id and, for in-channel messages,
//! the original message. Everything else has to be recovered from strings:
//!
//! ```text
//! callback_<sub-command>_<fallback>_<action>_<session-id>
//! ```
//!
//! The fallback value names the prompting command (`Cmd` + PascalCase
//! name). For in-channel prompts Slack echoes it back in
//! `original_message.attachments[0].fallback`; for ephemeral prompts the
//! original message is not returned and the third callback-id field is
//! used instead.
//!
//! Fields written by [`CallbackId`] are escaped (`%` → `%25`, `_` → `%5F`)
//! so a field may itself contain underscores. Legacy ids carry no escapes
//! and decode to the same fields as before.

use std::borrow::Cow;

use serde::Deserialize;
use tracing::trace;

use crate::error::CommandInputError;
use crate::input::SubCommand;

/// Marker every fallback value starts with.
pub const FALLBACK_PREFIX: &str = "Cmd";

/// Marker every callback id starts with.
pub const CALLBACK_PREFIX: &str = "callback_";

/// Field value standing for a command's unnamed default sub-command.
const DEFAULT_FIELD: &str = "default";

const FIELD_SEPARATOR: char = '_';

// =============================================================================
// Payload
// =============================================================================

/// The JSON document Slack posts when a user clicks a prompt button.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationPayload {
    /// Callback id chosen when the prompt was issued.
    #[serde(default)]
    pub callback_id: Option<String>,
    /// The prompt message, only present for in-channel prompts.
    #[serde(default)]
    pub original_message: Option<OriginalMessage>,
    /// Buttons that were clicked.
    #[serde(default)]
    pub actions: Vec<PayloadAction>,
    /// The clicking user.
    #[serde(default)]
    pub user: Option<PayloadUser>,
    /// URL for follow-up messages.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Echoed prompt message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginalMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<PayloadAttachment>,
}

/// Attachment of the echoed prompt message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadAttachment {
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub callback_id: Option<String>,
}

/// A clicked button.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadAction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// User who clicked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ConfirmationPayload {
    /// Parse the raw `payload` form value.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::MalformedPayload`] if the document is not
    /// valid JSON of the expected shape.
    pub fn parse(raw: &str) -> Result<Self, CommandInputError> {
        serde_json::from_str(raw).map_err(|e| CommandInputError::MalformedPayload(e.to_string()))
    }

    /// The trimmed callback id.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::MalformedPayload`] if `callback_id` is
    /// absent or blank.
    pub fn callback_id(&self) -> Result<&str, CommandInputError> {
        self.callback_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CommandInputError::MalformedPayload("missing callback_id".to_string()))
    }

    /// Value of the first clicked button.
    #[must_use]
    pub fn callback_value(&self) -> Option<&str> {
        self.actions.first().and_then(|a| a.value.as_deref())
    }

    /// Fallback of the echoed in-channel message, if any.
    #[must_use]
    pub fn in_channel_fallback(&self) -> Option<&str> {
        self.original_message
            .as_ref()
            .and_then(|m| m.attachments.first())
            .and_then(|a| a.fallback.as_deref())
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Name of the clicking user.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    /// Slack id of the clicking user.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.id.as_deref())
    }
}

// =============================================================================
// Correlation
// =============================================================================

/// Parse a raw payload document and return its trimmed callback id.
///
/// # Errors
///
/// Returns [`CommandInputError::MalformedPayload`] if the document cannot be
/// parsed or has no `callback_id`.
pub fn extract_callback_id(raw_payload: &str) -> Result<String, CommandInputError> {
    ConfirmationPayload::parse(raw_payload)?
        .callback_id()
        .map(str::to_string)
}

/// Resolve which command issued the prompt.
///
/// Tries the in-channel message shape first, then the third field of the
/// callback id.
///
/// # Errors
///
/// Returns [`CommandInputError::UnresolvedFallback`] if neither shape
/// yields a value.
pub fn resolve_fallback_value(payload: &ConfirmationPayload) -> Result<String, CommandInputError> {
    if let Some(fallback) = payload.in_channel_fallback() {
        trace!(fallback, "fallback from in-channel message");
        return Ok(fallback.to_string());
    }

    let callback_id = payload
        .callback_id()
        .map_err(|_| CommandInputError::UnresolvedFallback)?;

    let field = callback_id
        .split(FIELD_SEPARATOR)
        .nth(2)
        .filter(|f| !f.is_empty())
        .ok_or(CommandInputError::UnresolvedFallback)?;

    let fallback = unescape(field).map_err(|_| CommandInputError::UnresolvedFallback)?;
    trace!(fallback = %fallback, "fallback from callback id");
    Ok(fallback.into_owned())
}

/// Turn a fallback value (`CmdProps`) into a canonical command name
/// (`props`).
///
/// # Errors
///
/// Returns [`CommandInputError::InvalidFallbackFormat`] if the value lacks
/// the `Cmd` prefix or names nothing after it.
pub fn fallback_to_command(fallback: &str) -> Result<String, CommandInputError> {
    fallback
        .strip_prefix(FALLBACK_PREFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| CommandInputError::InvalidFallbackFormat(fallback.to_string()))
}

/// The fallback value a command's prompts carry (`props` → `CmdProps`).
#[must_use]
pub fn command_to_fallback(command: &str) -> String {
    let mut chars = command.chars();
    let pascal: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    format!("{FALLBACK_PREFIX}{pascal}")
}

/// Read the sub-command from a callback id.
///
/// # Errors
///
/// Returns [`CommandInputError::InvalidCallbackIdFormat`] if the id lacks
/// the `callback_` prefix or has no sub-command field.
pub fn callback_id_to_sub_command(callback_id: &str) -> Result<SubCommand, CommandInputError> {
    let invalid = || CommandInputError::InvalidCallbackIdFormat(callback_id.to_string());

    if !callback_id.starts_with(CALLBACK_PREFIX) {
        return Err(invalid());
    }

    let field = callback_id
        .split(FIELD_SEPARATOR)
        .nth(1)
        .filter(|f| !f.is_empty())
        .ok_or_else(invalid)?;

    if field == DEFAULT_FIELD {
        return Ok(SubCommand::Default);
    }

    let name = unescape(field).map_err(|_| invalid())?;
    Ok(SubCommand::from_token(&name))
}

// =============================================================================
// Building callback ids
// =============================================================================

/// Identifier of a saved prompt in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    const GENERATED_LENGTH: usize = 8;

    /// Wrap an existing id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(Self::GENERATED_LENGTH);
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The structured content of a callback id.
///
/// ```
/// use slack_bud_core::{CallbackId, SessionId, SubCommand};
///
/// let id = CallbackId::new(SubCommand::named("set"), "CmdProps")
///     .with_action("confirm")
///     .with_session(SessionId::new("ab12"));
/// assert_eq!(id.to_string(), "callback_set_CmdProps_confirm_ab12");
///
/// let parsed = CallbackId::parse("callback_set_CmdProps_confirm_ab12").unwrap();
/// assert_eq!(parsed, id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackId {
    pub sub_command: SubCommand,
    pub fallback: String,
    pub action: Option<String>,
    pub session_id: Option<SessionId>,
}

impl CallbackId {
    /// Create a callback id for a prompt issued by `fallback`.
    #[must_use]
    pub fn new(sub_command: SubCommand, fallback: impl Into<String>) -> Self {
        Self {
            sub_command,
            fallback: fallback.into(),
            action: None,
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Parse a callback id in either the escaped or the legacy form.
    ///
    /// Fields after the session id are folded back into it, joined with
    /// `_`, which is what a legacy id with an underscore in its tail meant.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::InvalidCallbackIdFormat`] if the prefix
    /// or the fallback field is missing, or a field has a broken escape.
    pub fn parse(callback_id: &str) -> Result<Self, CommandInputError> {
        let invalid = || CommandInputError::InvalidCallbackIdFormat(callback_id.to_string());

        let sub_command = callback_id_to_sub_command(callback_id)?;

        let mut fields = callback_id.split(FIELD_SEPARATOR).skip(2);
        let fallback = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(invalid)
            .and_then(|f| unescape(f).map_err(|_| invalid()))?
            .into_owned();

        let action = fields
            .next()
            .map(|f| unescape(f).map(Cow::into_owned).map_err(|_| invalid()))
            .transpose()?
            .filter(|a| !a.is_empty());

        let tail: Vec<&str> = fields.collect();
        let session_id = if tail.is_empty() {
            None
        } else {
            let joined = tail.join("_");
            let id = unescape(&joined).map_err(|_| invalid())?;
            Some(SessionId::new(id.into_owned())).filter(|s| !s.as_str().is_empty())
        };

        Ok(Self {
            sub_command,
            fallback,
            action,
            session_id,
        })
    }

    /// The command name encoded in the fallback field.
    ///
    /// # Errors
    ///
    /// See [`fallback_to_command`].
    pub fn command(&self) -> Result<String, CommandInputError> {
        fallback_to_command(&self.fallback)
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sub = match &self.sub_command {
            SubCommand::Default => Cow::Borrowed(DEFAULT_FIELD),
            SubCommand::Named(name) => escape(name),
        };
        write!(f, "{CALLBACK_PREFIX}{sub}_{}", escape(&self.fallback))?;

        match (&self.action, &self.session_id) {
            (Some(action), Some(session)) => {
                write!(f, "_{}_{}", escape(action), escape(session.as_str()))
            }
            (Some(action), None) => write!(f, "_{}", escape(action)),
            (None, Some(session)) => write!(f, "__{}", escape(session.as_str())),
            (None, None) => Ok(()),
        }
    }
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(['%', FIELD_SEPARATOR]) {
        Cow::Owned(field.replace('%', "%25").replace(FIELD_SEPARATOR, "%5F"))
    } else {
        Cow::Borrowed(field)
    }
}

fn unescape(field: &str) -> Result<Cow<'_, str>, std::string::FromUtf8Error> {
    urlencoding::decode(field)
}
