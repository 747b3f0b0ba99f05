//! The per-invocation command context.

use std::any::Any;
use std::collections::BTreeMap;

use tracing::debug;

use crate::callback::{self, ConfirmationPayload};
use crate::error::CommandInputError;
use crate::location::ExecutionLocation;
use crate::params::{InvocationKind, PAYLOAD_KEY, ParamBag};
use crate::tokenizer;

/// Environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// String form of [`SubCommand::Default`] inside `arg_list` and on the wire.
pub const DEFAULT_SUB_COMMAND_MARKER: &str = "(default)";

/// A command's sub-command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubCommand {
    /// The command's unnamed default sub-command.
    Default,
    /// A named sub-command such as `set` or `list`.
    Named(String),
}

impl SubCommand {
    /// Convenience constructor for a named sub-command.
    ///
    /// The default marker is never a name; it yields [`Self::Default`].
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == DEFAULT_SUB_COMMAND_MARKER {
            Self::Default
        } else {
            Self::Named(name)
        }
    }

    /// Read a token, recognizing the default marker.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token == DEFAULT_SUB_COMMAND_MARKER {
            Self::Default
        } else {
            Self::Named(token.to_string())
        }
    }

    /// Token form; the default sub-command renders as its marker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => DEFAULT_SUB_COMMAND_MARKER,
            Self::Named(name) => name,
        }
    }

    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl std::fmt::Display for SubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a [`CommandInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    /// Built from a slash command.
    StandardParsed,
    /// Built from a confirmation click.
    ConfirmationParsed,
    /// The running process has bound its execution location.
    ExecutionLocationBound,
}

/// Everything known about one invocation.
///
/// Built once at the ingress boundary, completed by the dispatcher, and
/// optionally carried to a worker as a [`WireRecord`](crate::WireRecord).
/// Exactly one of the standard fields (`raw_command_line`, `user_id`,
/// `user_name`) or the confirmation fields (`callback_id`,
/// `callback_value`) is populated, as given by [`is_confirmation`].
///
/// [`is_confirmation`]: CommandInput::is_confirmation
pub struct CommandInput {
    pub(crate) response_target: Option<String>,
    pub(crate) raw_command_line: Option<String>,
    pub(crate) arg_list: Vec<String>,
    pub(crate) arg_dict: BTreeMap<String, String>,
    pub(crate) environment: String,
    pub(crate) user_id: Option<String>,
    pub(crate) user_name: Option<String>,
    pub(crate) command: Option<String>,
    pub(crate) sub_command: Option<SubCommand>,
    pub(crate) is_confirmation: bool,
    pub(crate) callback_value: Option<String>,
    pub(crate) callback_id: Option<String>,
    pub(crate) confirmation_params: BTreeMap<String, serde_json::Value>,
    pub(crate) is_ephemeral: bool,
    pub(crate) execution_location: Option<ExecutionLocation>,
    pub(crate) command_data: Option<Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for CommandInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInput")
            .field("command", &self.command)
            .field("sub_command", &self.sub_command)
            .field("arg_list", &self.arg_list)
            .field("arg_dict", &self.arg_dict)
            .field("environment", &self.environment)
            .field("user_name", &self.user_name)
            .field("is_confirmation", &self.is_confirmation)
            .field("callback_id", &self.callback_id)
            .field("callback_value", &self.callback_value)
            .field("is_ephemeral", &self.is_ephemeral)
            .field("execution_location", &self.execution_location)
            .field(
                "command_data",
                &self.command_data.as_ref().map(|_| "<opaque>"),
            )
            .finish_non_exhaustive()
    }
}

/// Inputs of the standard (slash command) path.
#[derive(Debug, Clone, Default)]
pub struct StandardParams<'a> {
    pub text: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub user_name: Option<&'a str>,
    pub response_url: Option<&'a str>,
}

impl CommandInput {
    /// Build the context for one inbound parameter bag.
    ///
    /// A bag with a `payload` entry is a confirmation click; anything else
    /// is a slash command.
    ///
    /// # Errors
    ///
    /// Propagates every tokenizer and correlator error; no partially
    /// resolved input is ever returned.
    pub fn from_params(
        bag: &ParamBag,
        environment: impl Into<String>,
    ) -> Result<Self, CommandInputError> {
        match InvocationKind::of(bag) {
            InvocationKind::Standard => Self::standard(
                &StandardParams {
                    text: bag.first("text"),
                    user_id: bag.first("user_id"),
                    user_name: bag.first("user_name"),
                    response_url: bag.first("response_url"),
                },
                environment,
            ),
            InvocationKind::Confirmation => {
                let raw = bag.first(PAYLOAD_KEY).unwrap_or_default();
                let payload = ConfirmationPayload::parse(raw)?;
                Self::confirmation(&payload, environment)
            }
        }
    }

    /// Build the context of a slash command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::UnbalancedQuotes`] for an unterminated
    /// quote.
    pub fn standard(
        params: &StandardParams<'_>,
        environment: impl Into<String>,
    ) -> Result<Self, CommandInputError> {
        let raw_command_line = non_empty(params.text);
        let arg_list = tokenizer::tokenize(raw_command_line.as_deref())?;
        let command = tokenizer::command_token(&arg_list);
        let sub_command = tokenizer::sub_command_token(&arg_list).map(SubCommand::from_token);

        debug!(
            cmd = ?command,
            sub_cmd = ?sub_command,
            args = arg_list.len(),
            "parsed standard invocation"
        );

        Ok(Self {
            response_target: non_empty(params.response_url),
            raw_command_line,
            arg_list,
            user_id: non_empty(params.user_id),
            user_name: non_empty(params.user_name),
            command,
            sub_command,
            ..Self::empty(environment.into(), false)
        })
    }

    /// Convenience for a slash command with only its text.
    ///
    /// # Errors
    ///
    /// See [`standard`](Self::standard).
    pub fn from_text(text: &str, environment: impl Into<String>) -> Result<Self, CommandInputError> {
        Self::standard(
            &StandardParams {
                text: Some(text),
                ..StandardParams::default()
            },
            environment,
        )
    }

    /// Build the context of a confirmation click.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::MalformedPayload`],
    /// [`CommandInputError::UnresolvedFallback`],
    /// [`CommandInputError::InvalidFallbackFormat`] or
    /// [`CommandInputError::InvalidCallbackIdFormat`].
    pub fn confirmation(
        payload: &ConfirmationPayload,
        environment: impl Into<String>,
    ) -> Result<Self, CommandInputError> {
        let callback_id = payload.callback_id()?.to_string();
        let fallback = callback::resolve_fallback_value(payload)?;
        let command = callback::fallback_to_command(&fallback)?;
        let sub_command = callback::callback_id_to_sub_command(&callback_id)?;

        debug!(
            cmd = %command,
            sub_cmd = %sub_command,
            callback_id = %callback_id,
            "parsed confirmation invocation"
        );

        Ok(Self {
            response_target: non_empty(payload.response_url.as_deref()),
            command: Some(command),
            sub_command: Some(sub_command),
            callback_value: non_empty(payload.callback_value()),
            callback_id: Some(callback_id),
            ..Self::empty(environment.into(), true)
        })
    }

    pub(crate) fn empty(environment: String, is_confirmation: bool) -> Self {
        Self {
            response_target: None,
            raw_command_line: None,
            arg_list: Vec::new(),
            arg_dict: BTreeMap::new(),
            environment: if environment.is_empty() {
                DEFAULT_ENVIRONMENT.to_string()
            } else {
                environment
            },
            user_id: None,
            user_name: None,
            command: None,
            sub_command: None,
            is_confirmation,
            callback_value: None,
            callback_id: None,
            confirmation_params: BTreeMap::new(),
            is_ephemeral: true,
            execution_location: None,
            command_data: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn response_target(&self) -> Option<&str> {
        self.response_target.as_deref()
    }

    #[must_use]
    pub fn raw_command_line(&self) -> Option<&str> {
        self.raw_command_line.as_deref()
    }

    #[must_use]
    pub fn arg_list(&self) -> &[String] {
        &self.arg_list
    }

    #[must_use]
    pub const fn arg_dict(&self) -> &BTreeMap<String, String> {
        &self.arg_dict
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Canonical lower-case command name.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    #[must_use]
    pub const fn sub_command(&self) -> Option<&SubCommand> {
        self.sub_command.as_ref()
    }

    #[must_use]
    pub const fn is_confirmation(&self) -> bool {
        self.is_confirmation
    }

    #[must_use]
    pub fn callback_value(&self) -> Option<&str> {
        self.callback_value.as_deref()
    }

    #[must_use]
    pub fn callback_id(&self) -> Option<&str> {
        self.callback_id.as_deref()
    }

    #[must_use]
    pub const fn confirmation_params(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.confirmation_params
    }

    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        self.is_ephemeral
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> InputState {
        if self.execution_location.is_some() {
            InputState::ExecutionLocationBound
        } else if self.is_confirmation {
            InputState::ConfirmationParsed
        } else {
            InputState::StandardParsed
        }
    }

    /// Positional argument `index`, counting the command itself as 0.
    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&str> {
        self.arg_list.get(index).map(String::as_str)
    }

    /// Value of a validated switch; `-service`, `--service` and `service`
    /// all look up the same entry.
    #[must_use]
    pub fn by_key(&self, name: &str) -> Option<&str> {
        self.arg_dict
            .get(name.trim_start_matches('-'))
            .map(String::as_str)
    }

    /// Whether `--name` appears verbatim in the argument list.
    #[must_use]
    pub fn has_raw_switch(&self, name: &str) -> bool {
        let switch = format!("--{name}");
        self.arg_list.iter().any(|arg| *arg == switch)
    }

    // -------------------------------------------------------------------------
    // Second-pass mutation (dispatcher)
    // -------------------------------------------------------------------------

    /// Insert the default sub-command marker at position 1 of `arg_list`
    /// and route to the default sub-command, so handlers with both named
    /// and default sub-commands index their positional arguments the same
    /// way.
    pub fn insert_default_sub_command_marker(&mut self) {
        let at = self.arg_list.len().min(1);
        self.arg_list
            .insert(at, DEFAULT_SUB_COMMAND_MARKER.to_string());
        self.sub_command = Some(SubCommand::Default);
    }

    /// Replace the validated switches.
    pub fn set_arg_dict(&mut self, arg_dict: BTreeMap<String, String>) {
        self.arg_dict = arg_dict;
    }

    /// Attach the parameters saved with the prompt being confirmed.
    pub fn set_confirmation_params(&mut self, params: BTreeMap<String, serde_json::Value>) {
        self.confirmation_params = params;
    }

    /// Make the response visible to the whole channel.
    pub fn make_public(&mut self) {
        self.is_ephemeral = false;
    }

    /// Bind where this invocation runs. May be called once.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::ExecutionLocationInvalid`] on a second
    /// call.
    pub fn set_execution_location(
        &mut self,
        location: ExecutionLocation,
    ) -> Result<(), CommandInputError> {
        if self.execution_location.is_some() {
            return Err(CommandInputError::ExecutionLocationInvalid);
        }
        self.execution_location = Some(location);
        Ok(())
    }

    /// Where this invocation runs.
    ///
    /// # Errors
    ///
    /// Returns [`CommandInputError::ExecutionLocationNotSet`] if the
    /// location has not been bound yet.
    pub fn execution_location(&self) -> Result<ExecutionLocation, CommandInputError> {
        self.execution_location
            .ok_or(CommandInputError::ExecutionLocationNotSet)
    }

    /// Attach handler-specific data. Never transported over the wire.
    pub fn set_command_data<T: Any + Send + Sync>(&mut self, data: T) {
        self.command_data = Some(Box::new(data));
    }

    /// Handler-specific data, if set and of type `T`.
    #[must_use]
    pub fn command_data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.command_data.as_ref()?.downcast_ref::<T>()
    }
}

/// Absent and empty are the same thing for optional fields.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
