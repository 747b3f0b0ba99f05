//! Errors raised while building, correlating and transporting a
//! [`CommandInput`](crate::CommandInput).

use thiserror::Error;

/// Errors produced by the command-input correlation protocol.
///
/// Every variant is raised synchronously by the component that detected
/// it. Only the ingress boundary is expected to catch these and turn them
/// into a user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandInputError {
    /// The confirmation payload could not be parsed or has no `callback_id`.
    #[error("malformed confirmation payload: {0}")]
    MalformedPayload(String),

    /// Neither the in-channel nor the ephemeral message shape carried a
    /// fallback value.
    #[error("could not resolve fallback value from confirmation payload")]
    UnresolvedFallback,

    /// The fallback value does not start with the command marker.
    #[error("invalid fallback value: {0:?}")]
    InvalidFallbackFormat(String),

    /// The callback id does not follow the `callback_` convention.
    #[error("invalid callback id: {0:?}")]
    InvalidCallbackIdFormat(String),

    /// A wire record is missing a required key or has a bad value.
    #[error("malformed wire record: {0}")]
    MalformedWireRecord(String),

    /// A confirmation references a session that was never stored or has
    /// expired.
    #[error("session {0} has expired or does not exist")]
    SessionExpired(String),

    /// The execution location was read before it was bound.
    #[error("execution location has not been set")]
    ExecutionLocationNotSet,

    /// The execution location was bound a second time.
    #[error("execution location can only be set once")]
    ExecutionLocationInvalid,

    /// The raw command line has an unterminated quote.
    #[error("unbalanced quotes in command line: {0:?}")]
    UnbalancedQuotes(String),
}

impl CommandInputError {
    /// Short, user-facing description suitable for a chat reply.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SessionExpired(_) => {
                "This confirmation has expired. Please run the command again.".to_string()
            }
            Self::UnbalancedQuotes(_) => {
                "Your command has an unterminated quote. Check the quoting and try again."
                    .to_string()
            }
            Self::ExecutionLocationNotSet | Self::ExecutionLocationInvalid => {
                "Internal error while running the command.".to_string()
            }
            _ => format!("Could not understand the request: {self}"),
        }
    }
}
