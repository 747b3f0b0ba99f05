//! CLI command implementations.
//!
//! Each command returns the text to print; `main` owns stdout.

pub mod parse;
pub mod wire;

use std::io::Read;
use std::path::Path;

use serde_json::{Value, json};
use slack_bud_core::{CommandInput, CommandInputError};
use thiserror::Error;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The protocol rejected the input.
    #[error(transparent)]
    Protocol(#[from] CommandInputError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a file, or stdin for `-`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the source cannot be read.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Human-oriented view of a parsed input.
fn describe(input: &CommandInput) -> Value {
    json!({
        "kind": if input.is_confirmation() { "confirmation" } else { "standard" },
        "command": input.command(),
        "sub_command": input.sub_command().map(ToString::to_string),
        "arg_list": input.arg_list(),
        "arg_dict": input.arg_dict(),
        "environment": input.environment(),
        "user_name": input.user_name(),
        "callback_id": input.callback_id(),
        "callback_value": input.callback_value(),
        "confirmation_params": input.confirmation_params(),
        "response_target": input.response_target(),
        "ephemeral": input.is_ephemeral(),
    })
}

fn pretty(value: &Value) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}
