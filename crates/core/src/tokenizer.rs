//! Shell-style tokenizing of raw slash-command text.

use crate::error::CommandInputError;

/// Split a raw command line into positional tokens.
///
/// Single- and double-quoted runs become one token with the quotes
/// stripped; unquoted whitespace separates tokens. `None` and blank input
/// yield an empty list.
///
/// # Errors
///
/// Returns [`CommandInputError::UnbalancedQuotes`] if a quote is left open.
pub fn tokenize(raw: Option<&str>) -> Result<Vec<String>, CommandInputError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    shlex::split(raw).ok_or_else(|| CommandInputError::UnbalancedQuotes(raw.to_string()))
}

/// Whether a token names a switch (`-e`, `--env`).
#[must_use]
pub fn is_switch(token: &str) -> bool {
    token.starts_with('-')
}

/// The canonical command name from the first token.
#[must_use]
pub fn command_token(tokens: &[String]) -> Option<String> {
    tokens
        .first()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
}

/// The sub-command token: the second token unless it is a switch.
#[must_use]
pub fn sub_command_token(tokens: &[String]) -> Option<&str> {
    tokens
        .get(1)
        .map(String::as_str)
        .filter(|t| !t.is_empty() && !is_switch(t))
}
