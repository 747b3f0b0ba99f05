//! Transport of a [`CommandInput`] across an execution boundary.
//!
//! The synchronous request handler has to answer Slack within three
//! seconds, so real work happens in a separate worker. The worker shares no
//! memory with the handler and receives only a [`WireRecord`]. Absent
//! values have no wire representation of their own and travel as `""`.
//! The execution location and handler-specific data are never transported:
//! the receiving process binds its own location.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CommandInputError;
use crate::input::{CommandInput, SubCommand, non_empty};

/// The flat record a [`CommandInput`] travels as.
///
/// Every key is always present; field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireRecord {
    pub response_url: String,
    pub raw_cmd_line: String,
    pub arg_list: Vec<String>,
    pub is_ephemeral: bool,
    pub arg_dict: BTreeMap<String, String>,
    pub slack_bud_env: String,
    pub slack_user_id: String,
    pub slack_user_name: String,
    pub cmd: String,
    pub sub_cmd: String,
    pub is_confirmation_cmd: bool,
    pub callback_value: String,
    pub callback_id: String,
    pub confirmation_params: BTreeMap<String, serde_json::Value>,
}

/// Serialize the transported fields of `input`.
#[must_use]
pub fn encode(input: &CommandInput) -> WireRecord {
    WireRecord {
        response_url: sentinel(input.response_target.as_deref()),
        raw_cmd_line: sentinel(input.raw_command_line.as_deref()),
        arg_list: input.arg_list.clone(),
        is_ephemeral: input.is_ephemeral,
        arg_dict: input.arg_dict.clone(),
        slack_bud_env: input.environment.clone(),
        slack_user_id: sentinel(input.user_id.as_deref()),
        slack_user_name: sentinel(input.user_name.as_deref()),
        cmd: sentinel(input.command.as_deref()),
        sub_cmd: sentinel(input.sub_command.as_ref().map(SubCommand::as_str)),
        is_confirmation_cmd: input.is_confirmation,
        callback_value: sentinel(input.callback_value.as_deref()),
        callback_id: sentinel(input.callback_id.as_deref()),
        confirmation_params: input.confirmation_params.clone(),
    }
}

/// Rebuild a [`CommandInput`] from a wire record.
///
/// The result has no execution location and no handler-specific data.
///
/// # Errors
///
/// Returns [`CommandInputError::MalformedWireRecord`] if the command name
/// is not canonical (lower-case).
pub fn decode(record: WireRecord) -> Result<CommandInput, CommandInputError> {
    let command = non_empty(Some(&record.cmd));
    if let Some(cmd) = command.as_deref().filter(|c| *c != c.to_lowercase()) {
        return Err(CommandInputError::MalformedWireRecord(format!(
            "cmd {cmd:?} is not lower-case"
        )));
    }

    let mut input = CommandInput::empty(record.slack_bud_env, record.is_confirmation_cmd);
    input.response_target = non_empty(Some(&record.response_url));
    input.raw_command_line = non_empty(Some(&record.raw_cmd_line));
    input.arg_list = record.arg_list;
    input.is_ephemeral = record.is_ephemeral;
    input.arg_dict = record.arg_dict;
    input.user_id = non_empty(Some(&record.slack_user_id));
    input.user_name = non_empty(Some(&record.slack_user_name));
    input.command = command;
    input.sub_command = non_empty(Some(&record.sub_cmd)).map(|s| SubCommand::from_token(&s));
    input.callback_value = non_empty(Some(&record.callback_value));
    input.callback_id = non_empty(Some(&record.callback_id));
    input.confirmation_params = record.confirmation_params;
    Ok(input)
}

/// Encode straight to a JSON string.
///
/// # Errors
///
/// Returns [`CommandInputError::MalformedWireRecord`] if a confirmation
/// parameter cannot be serialized.
pub fn to_json(input: &CommandInput) -> Result<String, CommandInputError> {
    serde_json::to_string(&encode(input))
        .map_err(|e| CommandInputError::MalformedWireRecord(e.to_string()))
}

/// Decode from a JSON string.
///
/// # Errors
///
/// Returns [`CommandInputError::MalformedWireRecord`] if a key is missing,
/// unknown or has the wrong type.
pub fn from_json(json: &str) -> Result<CommandInput, CommandInputError> {
    let record: WireRecord = serde_json::from_str(json)
        .map_err(|e| CommandInputError::MalformedWireRecord(e.to_string()))?;
    decode(record)
}

/// Decode from an already-parsed JSON value.
///
/// # Errors
///
/// See [`from_json`].
pub fn from_value(value: serde_json::Value) -> Result<CommandInput, CommandInputError> {
    let record: WireRecord = serde_json::from_value(value)
        .map_err(|e| CommandInputError::MalformedWireRecord(e.to_string()))?;
    decode(record)
}

fn sentinel(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::location::ExecutionLocation;
    use crate::params::ParamBag;

    const KEYS: [&str; 14] = [
        "response_url",
        "raw_cmd_line",
        "arg_list",
        "is_ephemeral",
        "arg_dict",
        "slack_bud_env",
        "slack_user_id",
        "slack_user_name",
        "cmd",
        "sub_cmd",
        "is_confirmation_cmd",
        "callback_value",
        "callback_id",
        "confirmation_params",
    ];

    fn standard_input() -> CommandInput {
        let bag = ParamBag::new()
            .with("user_id", "U123")
            .with("user_name", "jane")
            .with("text", r#"props set maxRetries "3 retries" -s content"#)
            .with("response_url", "https://hooks.slack.com/commands/T/1/x");
        let mut input = CommandInput::from_params(&bag, "prod").unwrap();
        input.set_arg_dict(BTreeMap::from([(
            "service".to_string(),
            "content".to_string(),
        )]));
        input
    }

    fn confirmation_input() -> CommandInput {
        let payload = json!({
            "callback_id": "callback_default_CmdCanary_env_ab12",
            "actions": [{"value": "yes"}],
        });
        let bag = ParamBag::new().with("payload", payload.to_string());
        let mut input = CommandInput::from_params(&bag, "dev").unwrap();
        input.set_confirmation_params(BTreeMap::from([
            ("env".to_string(), json!("prod")),
            ("services".to_string(), json!(["content", "search"])),
        ]));
        input
    }

    #[test]
    fn test_record_has_exact_key_set() {
        let value = serde_json::to_value(encode(&standard_input())).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), KEYS.len());
        for key in KEYS {
            assert!(object.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_record_key_order() {
        let json = to_json(&standard_input()).unwrap();
        let positions: Vec<usize> = KEYS
            .iter()
            .map(|k| json.find(&format!("\"{k}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_standard_round_trip() {
        let input = standard_input();
        let record = encode(&input);
        let decoded = decode(record.clone()).unwrap();

        assert_eq!(encode(&decoded), record);
        assert_eq!(decoded.command(), Some("props"));
        assert_eq!(decoded.sub_command(), Some(&SubCommand::named("set")));
        assert_eq!(decoded.by_key("service"), Some("content"));
        assert_eq!(decoded.user_name(), Some("jane"));
        assert!(!decoded.is_confirmation());
    }

    #[test]
    fn test_confirmation_round_trip() {
        let input = confirmation_input();
        let decoded = from_json(&to_json(&input).unwrap()).unwrap();

        assert_eq!(encode(&decoded), encode(&input));
        assert!(decoded.is_confirmation());
        assert_eq!(decoded.sub_command(), Some(&SubCommand::Default));
        assert_eq!(decoded.confirmation_params().get("env"), Some(&json!("prod")));
    }

    #[test]
    fn test_marker_sub_command_in_callback_id_round_trips() {
        let payload = json!({"callback_id": "callback_(default)_CmdProps_confirm_ab12"});
        let bag = ParamBag::new().with("payload", payload.to_string());
        let input = CommandInput::from_params(&bag, "dev").unwrap();
        assert_eq!(input.sub_command(), Some(&SubCommand::Default));

        let decoded = decode(encode(&input)).unwrap();
        assert_eq!(decoded.sub_command(), input.sub_command());
        assert_eq!(encode(&decoded), encode(&input));
    }

    #[test]
    fn test_encode_is_pure() {
        let input = confirmation_input();
        assert_eq!(encode(&input), encode(&input));
        assert_eq!(to_json(&input).unwrap(), to_json(&input).unwrap());
    }

    #[test]
    fn test_absent_round_trips_through_empty_string() {
        let input = CommandInput::from_text("help", "dev").unwrap();
        assert!(input.response_target().is_none());

        let record = encode(&input);
        assert_eq!(record.response_url, "");
        assert_eq!(record.sub_cmd, "");
        assert_eq!(record.callback_id, "");

        let decoded = decode(record).unwrap();
        assert!(decoded.response_target().is_none());
        assert!(decoded.sub_command().is_none());
        assert!(decoded.callback_id().is_none());
    }

    #[test]
    fn test_decode_drops_execution_location_and_command_data() {
        let mut input = standard_input();
        input.set_execution_location(ExecutionLocation::Sync).unwrap();
        input.set_command_data(42_u32);
        input.make_public();

        let decoded = decode(encode(&input)).unwrap();
        assert_eq!(
            decoded.execution_location(),
            Err(CommandInputError::ExecutionLocationNotSet)
        );
        assert!(decoded.command_data::<u32>().is_none());
        assert!(!decoded.is_ephemeral());
    }

    #[test]
    fn test_decode_missing_key() {
        let mut value = serde_json::to_value(encode(&standard_input())).unwrap();
        value.as_object_mut().unwrap().remove("callback_id");
        assert!(matches!(
            from_value(value),
            Err(CommandInputError::MalformedWireRecord(_))
        ));
    }

    #[test]
    fn test_decode_unknown_key() {
        let mut value = serde_json::to_value(encode(&standard_input())).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("execution_location".to_string(), json!("sync"));
        assert!(matches!(
            from_value(value),
            Err(CommandInputError::MalformedWireRecord(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_canonical_command() {
        let mut record = encode(&standard_input());
        record.cmd = "Props".to_string();
        assert!(matches!(
            decode(record),
            Err(CommandInputError::MalformedWireRecord(_))
        ));
    }

    #[test]
    fn test_decode_empty_environment_defaults() {
        let mut record = encode(&standard_input());
        record.slack_bud_env = String::new();
        assert_eq!(decode(record).unwrap().environment(), "dev");
    }
}
