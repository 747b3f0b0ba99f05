//! Parsing commands: `tokenize`, `classify`, `callback`.

use serde_json::json;
use slack_bud_core::{CallbackId, CommandInput, ParamBag, classify as is_confirmation, tokenizer};

use super::{CliError, describe, pretty};

/// Tokenize command text.
///
/// # Errors
///
/// Returns [`CliError::Protocol`] for an unterminated quote.
pub fn tokenize(text: &str) -> Result<String, CliError> {
    let tokens = tokenizer::tokenize(Some(text))?;
    pretty(&json!({
        "tokens": tokens,
        "command": tokenizer::command_token(&tokens),
        "sub_command": tokenizer::sub_command_token(&tokens),
    }))
}

/// Classify and parse a form body.
///
/// # Errors
///
/// Returns [`CliError::Protocol`] if the body cannot be parsed.
pub fn classify(body: &str, env: &str) -> Result<String, CliError> {
    let bag = ParamBag::from_form(body);
    tracing::debug!(confirmation = is_confirmation(&bag), "classified body");
    let input = CommandInput::from_params(&bag, env)?;
    pretty(&describe(&input))
}

/// Correlate a callback id.
///
/// # Errors
///
/// Returns [`CliError::Protocol`] if the id is malformed.
pub fn callback(callback_id: &str) -> Result<String, CliError> {
    let id = CallbackId::parse(callback_id.trim())?;
    pretty(&json!({
        "command": id.command()?,
        "sub_command": id.sub_command.to_string(),
        "fallback": id.fallback,
        "action": id.action,
        "session_id": id.session_id.as_ref().map(ToString::to_string),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;
    use slack_bud_core::CommandInputError;

    use super::*;

    fn parsed(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn test_tokenize() {
        let out = parsed(&tokenize(r#"Props set maxRetries "3 retries" -s content"#).unwrap());
        assert_eq!(out["tokens"][3], "3 retries");
        assert_eq!(out["command"], "props");
        assert_eq!(out["sub_command"], "set");
    }

    #[test]
    fn test_tokenize_unbalanced() {
        assert!(matches!(
            tokenize("props \"oops"),
            Err(CliError::Protocol(CommandInputError::UnbalancedQuotes(_)))
        ));
    }

    #[test]
    fn test_classify_standard() {
        let out = parsed(&classify("text=props+list&user_name=jane", "prod").unwrap());
        assert_eq!(out["kind"], "standard");
        assert_eq!(out["command"], "props");
        assert_eq!(out["sub_command"], "list");
        assert_eq!(out["user_name"], "jane");
        assert_eq!(out["environment"], "prod");
    }

    #[test]
    fn test_classify_confirmation() {
        let payload = r#"{"callback_id":"callback_default_CmdCanary_env_ab12","actions":[{"value":"yes"}]}"#;
        let body = format!("payload={}", urlencoding::encode(payload));
        let out = parsed(&classify(&body, "dev").unwrap());
        assert_eq!(out["kind"], "confirmation");
        assert_eq!(out["command"], "canary");
        assert_eq!(out["sub_command"], "(default)");
        assert_eq!(out["callback_value"], "yes");
    }

    #[test]
    fn test_callback() {
        let out = parsed(&callback("callback_set_CmdProps_confirm_ab12").unwrap());
        assert_eq!(out["command"], "props");
        assert_eq!(out["sub_command"], "set");
        assert_eq!(out["action"], "confirm");
        assert_eq!(out["session_id"], "ab12");
    }

    #[test]
    fn test_callback_invalid() {
        assert!(callback("cb_set_CmdProps").is_err());
        assert!(callback("callback_set_props_confirm").is_err());
    }
}
