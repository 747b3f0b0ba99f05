//! Slack Bud Core - the command-input correlation protocol.
//!
//! Every Slack invocation reaches the bot as a fresh, stateless execution.
//! This crate turns one inbound parameter bag into a [`CommandInput`]:
//! - slash commands are tokenized into a command, sub-command and arguments
//! - confirmation clicks are correlated back to the prompting command using
//!   only the callback id and the echoed message
//!
//! and carries that context to an asynchronous worker as a [`WireRecord`].
//!
//! # Architecture
//!
//! The core crate has no I/O, no async and no global state. Session
//! storage, dispatch and Slack HTTP calls live in `slack-bud-bot`.
//!
//! # Modules
//!
//! - [`params`] - Form-decoded parameter bags and classification
//! - [`tokenizer`] - Shell-style splitting of command text
//! - [`callback`] - Confirmation payloads and callback-id correlation
//! - [`input`] - The per-invocation [`CommandInput`]
//! - [`switches`] - Named switch schemas filling `arg_dict`
//! - [`wire`] - Transport across an execution boundary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod callback;
pub mod error;
pub mod input;
pub mod location;
pub mod params;
pub mod switches;
pub mod tokenizer;
pub mod wire;

pub use callback::{
    CallbackId, ConfirmationPayload, SessionId, callback_id_to_sub_command, command_to_fallback,
    extract_callback_id, fallback_to_command, resolve_fallback_value,
};
pub use error::CommandInputError;
pub use input::{
    CommandInput, DEFAULT_ENVIRONMENT, DEFAULT_SUB_COMMAND_MARKER, InputState, StandardParams,
    SubCommand,
};
pub use location::ExecutionLocation;
pub use params::{InvocationKind, ParamBag, classify};
pub use switches::{Switch, SwitchError, SwitchSchema};
pub use tokenizer::tokenize;
pub use wire::WireRecord;
