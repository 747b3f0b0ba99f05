//! Routing a completed [`CommandInput`] to the handler that owns its command.
//!
//! Handlers are registered once at startup. For a slash command the
//! dispatcher resolves the sub-command, validates switches and calls
//! [`CommandHandler::handle`]. For a confirmation click it takes the saved
//! prompt session named by the callback id, restores its parameters and
//! calls [`CommandHandler::confirm`].

mod help;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use slack_bud_core::{
    CallbackId, CommandInput, CommandInputError, SubCommand, SwitchError, SwitchSchema,
    command_to_fallback,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use help::{HelpEntry, HelpHandler};

use crate::session::{SessionRecord, SessionStore};
use crate::slack::{
    DENY_VALUE, SlackResponse, build_cancelled_response, build_prompt_response,
};

/// Action name used when a prompt does not choose one.
pub const DEFAULT_PROMPT_ACTION: &str = "confirm";

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while routing or running a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The invocation named no command.
    #[error("no command given")]
    NoCommand,

    /// No handler owns the command.
    #[error("unknown command {command:?}")]
    UnknownCommand {
        command: String,
        available: Vec<String>,
    },

    /// The handler does not have the requested sub-command.
    #[error("unknown sub-command {sub_command:?} for {command}")]
    UnknownSubCommand {
        command: String,
        sub_command: String,
        available: Vec<String>,
    },

    /// The handler needs a sub-command and none was given.
    #[error("{command} needs a sub-command")]
    MissingSubCommand {
        command: String,
        available: Vec<String>,
    },

    /// Switch validation failed.
    #[error(transparent)]
    Switch(#[from] SwitchError),

    /// The invocation could not be correlated.
    #[error(transparent)]
    Protocol(#[from] CommandInputError),

    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl DispatchError {
    /// Message shown to the invoking user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCommand => "Type a command, or `help` to list them.".to_string(),
            Self::UnknownCommand { command, available } => format!(
                "Unknown command `{command}`. Available: {}. Try `help`.",
                available.join(", ")
            ),
            Self::UnknownSubCommand {
                command,
                sub_command,
                available,
            } => format!(
                "`{command}` has no sub-command `{sub_command}`. Try one of: {}.",
                available.join(", ")
            ),
            Self::MissingSubCommand { command, available } => format!(
                "`{command}` needs one of: {}.",
                available.join(", ")
            ),
            Self::Switch(e) => format!("{e}. Try `help`."),
            Self::Protocol(e) => e.user_message(),
            Self::Handler(msg) => msg.clone(),
        }
    }
}

// =============================================================================
// Handler contract
// =============================================================================

/// A confirmation prompt requested by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPrompt {
    /// Message text above the buttons.
    pub text: String,
    /// Button name, echoed back in the callback id.
    pub action: String,
    /// Attachment text under the message.
    pub detail: Option<String>,
    pub confirm_label: String,
    pub deny_label: String,
    /// Parameters handed back to [`CommandHandler::confirm`].
    pub params: BTreeMap<String, serde_json::Value>,
}

impl ConfirmationPrompt {
    #[must_use]
    pub fn new(text: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: action.into(),
            detail: None,
            confirm_label: "Yes".to_string(),
            deny_label: "No".to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Button name; a blank action falls back to [`DEFAULT_PROMPT_ACTION`].
    #[must_use]
    pub fn action_name(&self) -> &str {
        let action = self.action.trim();
        if action.is_empty() {
            DEFAULT_PROMPT_ACTION
        } else {
            action
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_labels(mut self, confirm: impl Into<String>, deny: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.deny_label = deny.into();
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// What a handler wants sent back to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Reply visible to the invoking user only.
    Reply(String),
    /// Reply visible to the whole channel.
    PublicReply(String),
    /// Ask the user to confirm before going on.
    Prompt(ConfirmationPrompt),
}

/// A chat command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Canonical lower-case command name.
    fn name(&self) -> &'static str;

    /// One-line description for `help`.
    fn description(&self) -> &'static str;

    /// Named sub-commands. Empty for commands without sub-commands.
    fn sub_commands(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether an unrecognized second token routes to the default
    /// sub-command instead of failing.
    fn has_default_sub_command(&self) -> bool {
        false
    }

    /// Switches accepted by `sub_command`.
    fn schema(&self, _sub_command: Option<&SubCommand>) -> SwitchSchema {
        SwitchSchema::new()
    }

    /// Marker carried in the fallback of this command's prompts.
    fn fallback(&self) -> String {
        command_to_fallback(self.name())
    }

    /// Run a slash command.
    async fn handle(&self, input: &mut CommandInput) -> Result<HandlerOutcome, DispatchError>;

    /// Finish a confirmed prompt. `input.confirmation_params()` holds the
    /// prompt's parameters.
    async fn confirm(
        &self,
        _input: &mut CommandInput,
        _session: SessionRecord,
    ) -> Result<HandlerOutcome, DispatchError> {
        Err(DispatchError::Handler(format!(
            "`{}` does not take confirmations",
            self.name()
        )))
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Builder collecting handlers before the `help` listing is fixed.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: Vec<Arc<dyn CommandHandler>>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn register(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Finish registration, adding the built-in `help` command.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let mut entries: Vec<HelpEntry> = self
            .handlers
            .iter()
            .map(|h| HelpEntry::of(h.as_ref()))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut handlers: HashMap<&'static str, Arc<dyn CommandHandler>> = self
            .handlers
            .into_iter()
            .map(|h| (h.name(), h))
            .collect();
        handlers
            .entry(help::HELP_COMMAND)
            .or_insert_with(|| Arc::new(HelpHandler::new(entries)));

        Dispatcher { handlers }
    }
}

/// Registry of command handlers.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.command_names())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Registered command names, sorted.
    #[must_use]
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().map(|k| (*k).to_string()).collect();
        names.sort();
        names
    }

    fn handler(&self, input: &CommandInput) -> Result<&Arc<dyn CommandHandler>, DispatchError> {
        let command = input.command().ok_or(DispatchError::NoCommand)?;
        self.handlers
            .get(command)
            .ok_or_else(|| DispatchError::UnknownCommand {
                command: command.to_string(),
                available: self.command_names(),
            })
    }

    /// Run an invocation and render the reply.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the command cannot be routed, its
    /// switches are invalid, its prompt session is gone, or the handler
    /// fails.
    #[instrument(
        skip(self, input, sessions),
        fields(
            cmd = ?input.command(),
            sub_cmd = ?input.sub_command().map(SubCommand::as_str),
            confirmation = input.is_confirmation()
        )
    )]
    pub async fn dispatch(
        &self,
        input: &mut CommandInput,
        sessions: &SessionStore,
    ) -> Result<SlackResponse, DispatchError> {
        let handler = Arc::clone(self.handler(input)?);

        let outcome = if input.is_confirmation() {
            match confirm_prompt(handler.as_ref(), input, sessions).await? {
                Some(outcome) => outcome,
                None => {
                    let command = input.command().unwrap_or_default();
                    info!(cmd = %command, "Prompt declined");
                    return Ok(build_cancelled_response(command));
                }
            }
        } else {
            route_sub_command(handler.as_ref(), input)?;
            handler.schema(input.sub_command()).apply(input)?;
            handler.handle(input).await?
        };

        render(handler.as_ref(), input, sessions, outcome).await
    }
}

/// Returns `None` if the user declined the prompt.
async fn confirm_prompt(
    handler: &dyn CommandHandler,
    input: &mut CommandInput,
    sessions: &SessionStore,
) -> Result<Option<HandlerOutcome>, DispatchError> {
    let raw = input.callback_id().unwrap_or_default().to_string();
    let callback_id = CallbackId::parse(&raw)?;
    let session_id = callback_id
        .session_id
        .ok_or_else(|| CommandInputError::InvalidCallbackIdFormat(raw.clone()))?;

    // A click for another command must not consume this prompt.
    let stored = sessions.get(&session_id).await?;
    if Some(stored.command.as_str()) != input.command() {
        warn!(
            session_id = %session_id,
            cmd = %stored.command,
            "Session belongs to another command"
        );
        return Err(CommandInputError::SessionExpired(session_id.to_string()).into());
    }
    let session = sessions.take(&session_id).await?;

    if input.callback_value() == Some(DENY_VALUE) {
        return Ok(None);
    }

    debug!(session_id = %session_id, "Restoring prompt parameters");
    input.set_confirmation_params(session.params.clone());
    handler.confirm(input, session).await.map(Some)
}

/// Settle which sub-command a slash command runs.
fn route_sub_command(
    handler: &dyn CommandHandler,
    input: &mut CommandInput,
) -> Result<(), DispatchError> {
    let available = handler.sub_commands();
    if available.is_empty() {
        return Ok(());
    }

    let named = match input.sub_command() {
        Some(SubCommand::Named(name)) => Some(name.clone()),
        Some(SubCommand::Default) | None => None,
    };

    match named {
        Some(name) if available.contains(&name.as_str()) => Ok(()),
        _ if handler.has_default_sub_command() => {
            input.insert_default_sub_command_marker();
            Ok(())
        }
        Some(name) => Err(DispatchError::UnknownSubCommand {
            command: handler.name().to_string(),
            sub_command: name,
            available: available.iter().map(ToString::to_string).collect(),
        }),
        None => Err(DispatchError::MissingSubCommand {
            command: handler.name().to_string(),
            available: available.iter().map(ToString::to_string).collect(),
        }),
    }
}

async fn render(
    handler: &dyn CommandHandler,
    input: &mut CommandInput,
    sessions: &SessionStore,
    outcome: HandlerOutcome,
) -> Result<SlackResponse, DispatchError> {
    match outcome {
        HandlerOutcome::Reply(text) => {
            let response = SlackResponse::ephemeral(text);
            Ok(if input.is_confirmation() {
                response.replacing_original()
            } else {
                response
            })
        }
        HandlerOutcome::PublicReply(text) => {
            input.make_public();
            Ok(SlackResponse::in_channel(text))
        }
        HandlerOutcome::Prompt(prompt) => {
            let sub_command = input.sub_command().cloned().unwrap_or(SubCommand::Default);
            let record = SessionRecord {
                command: handler.name().to_string(),
                sub_command: input.sub_command().map(|s| s.as_str().to_string()),
                user_id: input.user_id().map(str::to_string),
                user_name: input.user_name().map(str::to_string),
                original_text: prompt.text.clone(),
                params: prompt.params.clone(),
                created_at: Utc::now(),
            };
            let session_id = sessions.store(record).await;

            let callback_id = CallbackId::new(sub_command, handler.fallback())
                .with_action(prompt.action_name())
                .with_session(session_id);

            info!(callback_id = %callback_id, "Issued confirmation prompt");
            Ok(build_prompt_response(&prompt, &callback_id))
        }
    }
}
