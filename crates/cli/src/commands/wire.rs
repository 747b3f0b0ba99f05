//! Wire record commands: `encode`, `decode`.

use slack_bud_core::{CommandInput, StandardParams, wire as codec};

use super::{CliError, describe, pretty};

/// Parse command text and render its wire record.
///
/// # Errors
///
/// Returns [`CliError::Protocol`] if the text cannot be parsed.
pub fn encode(
    text: &str,
    env: &str,
    user: Option<&str>,
    response_url: Option<&str>,
) -> Result<String, CliError> {
    let input = CommandInput::standard(
        &StandardParams {
            text: Some(text),
            user_name: user,
            response_url,
            ..StandardParams::default()
        },
        env,
    )?;
    Ok(serde_json::to_string_pretty(&codec::encode(&input))?)
}

/// Decode a wire record and summarize it.
///
/// # Errors
///
/// Returns [`CliError::Protocol`] if the record is malformed.
pub fn decode(json: &str) -> Result<String, CliError> {
    let input = codec::from_json(json)?;
    pretty(&describe(&input))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;
    use slack_bud_core::CommandInputError;

    use super::*;

    #[test]
    fn test_encode_then_decode() {
        let record = encode("canary -e prod", "prod", Some("jane"), None).unwrap();
        let json: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(json["cmd"], "canary");
        assert_eq!(json["slack_user_name"], "jane");
        assert_eq!(json["response_url"], "");

        let summary: Value = serde_json::from_str(&decode(&record).unwrap()).unwrap();
        assert_eq!(summary["command"], "canary");
        assert_eq!(summary["environment"], "prod");
        assert_eq!(summary["response_target"], Value::Null);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode(r#"{"cmd": "props"}"#),
            Err(CliError::Protocol(CommandInputError::MalformedWireRecord(_)))
        ));
    }
}
