//! Named switches (`-s content`, `--env prod`, `--dry-run`).
//!
//! Handlers declare a [`SwitchSchema`] per sub-command; the dispatcher runs
//! it over the argument list and stores the result in
//! [`CommandInput::set_arg_dict`]. Positional tokens are left alone.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::input::CommandInput;
use crate::tokenizer::is_switch;

/// Value stored for a flag that was present.
pub const FLAG_PRESENT: &str = "true";

/// Errors raised while validating switches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// A switch is not declared by the schema.
    #[error("unknown switch {0:?}")]
    Unknown(String),

    /// A value switch was last on the line.
    #[error("switch {0:?} needs a value")]
    MissingValue(String),

    /// A required switch was not given.
    #[error("missing required switch --{0}")]
    MissingRequired(String),
}

/// One declared switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    name: String,
    alias: Option<char>,
    required: bool,
    default: Option<String>,
    flag: bool,
}

impl Switch {
    /// A switch taking a value.
    #[must_use]
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            required: false,
            default: None,
            flag: false,
        }
    }

    /// A boolean switch taking no value.
    #[must_use]
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            flag: true,
            ..Self::value(name)
        }
    }

    #[must_use]
    pub const fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, bare: &str) -> bool {
        if bare == self.name {
            return true;
        }
        let mut chars = bare.chars();
        matches!((chars.next(), chars.next(), self.alias), (Some(c), None, Some(a)) if c == a)
    }

    /// One-line usage, e.g. `-s|--service <value> (required)`.
    #[must_use]
    pub fn usage(&self) -> String {
        let mut usage = match self.alias {
            Some(alias) => format!("-{alias}|--{}", self.name),
            None => format!("--{}", self.name),
        };
        if !self.flag {
            usage.push_str(" <value>");
        }
        if self.required {
            usage.push_str(" (required)");
        } else if let Some(default) = &self.default {
            usage.push_str(&format!(" (default: {default})"));
        }
        usage
    }
}

/// The switches a sub-command accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchSchema {
    switches: Vec<Switch>,
}

impl SwitchSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, switch: Switch) -> Self {
        self.switches.push(switch);
        self
    }

    #[must_use]
    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    fn find(&self, token: &str) -> Option<&Switch> {
        let bare = token.trim_start_matches('-');
        self.switches.iter().find(|s| s.matches(bare))
    }

    /// Collect switch values from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns a [`SwitchError`] for undeclared switches, value switches
    /// without a value and absent required switches.
    pub fn validate(&self, tokens: &[String]) -> Result<BTreeMap<String, String>, SwitchError> {
        let mut values = BTreeMap::new();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            if !is_switch(token) {
                continue;
            }
            let switch = self
                .find(token)
                .ok_or_else(|| SwitchError::Unknown(token.clone()))?;

            let value = if switch.flag {
                FLAG_PRESENT.to_string()
            } else {
                iter.next()
                    .cloned()
                    .ok_or_else(|| SwitchError::MissingValue(token.clone()))?
            };
            values.insert(switch.name.clone(), value);
        }

        for switch in &self.switches {
            if values.contains_key(&switch.name) {
                continue;
            }
            if let Some(default) = &switch.default {
                values.insert(switch.name.clone(), default.clone());
            } else if switch.required {
                return Err(SwitchError::MissingRequired(switch.name.clone()));
            }
        }

        Ok(values)
    }

    /// Validate the input's arguments (after the command token) and store
    /// the result in its `arg_dict`.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn apply(&self, input: &mut CommandInput) -> Result<(), SwitchError> {
        let tokens = input.arg_list().get(1..).unwrap_or_default();
        let values = self.validate(tokens)?;
        input.set_arg_dict(values);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn schema() -> SwitchSchema {
        SwitchSchema::new()
            .with(Switch::value("service").alias('s').required())
            .with(Switch::value("env").alias('e').default_value("dev"))
            .with(Switch::flag("dry-run"))
    }

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_validate_aliases_and_defaults() {
        let values = schema()
            .validate(&tokens("set maxRetries 3 -s content"))
            .unwrap();
        assert_eq!(values.get("service").map(String::as_str), Some("content"));
        assert_eq!(values.get("env").map(String::as_str), Some("dev"));
        assert!(!values.contains_key("dry-run"));
    }

    #[test]
    fn test_validate_long_names_and_flags() {
        let values = schema()
            .validate(&tokens("--service content --env prod --dry-run"))
            .unwrap();
        assert_eq!(values.get("env").map(String::as_str), Some("prod"));
        assert_eq!(values.get("dry-run").map(String::as_str), Some(FLAG_PRESENT));
    }

    #[test]
    fn test_validate_single_dash_long_name() {
        let values = schema().validate(&tokens("-service content")).unwrap();
        assert_eq!(values.get("service").map(String::as_str), Some("content"));
    }

    #[test]
    fn test_validate_unknown_switch() {
        assert_eq!(
            schema().validate(&tokens("-s content -x 1")),
            Err(SwitchError::Unknown("-x".to_string()))
        );
    }

    #[test]
    fn test_validate_missing_value() {
        assert_eq!(
            schema().validate(&tokens("-s")),
            Err(SwitchError::MissingValue("-s".to_string()))
        );
    }

    #[test]
    fn test_validate_missing_required() {
        assert_eq!(
            schema().validate(&tokens("-e prod")),
            Err(SwitchError::MissingRequired("service".to_string()))
        );
    }

    #[test]
    fn test_apply_fills_arg_dict() {
        let mut input =
            CommandInput::from_text(r#"props set maxRetries "3 retries" -s content -e dev"#, "dev")
                .unwrap();
        schema().apply(&mut input).unwrap();

        assert_eq!(input.by_key("-s"), None);
        assert_eq!(input.by_key("-service"), Some("content"));
        assert_eq!(input.by_key("env"), Some("dev"));
        assert_eq!(input.by_index(3), Some("3 retries"));
    }

    #[test]
    fn test_usage() {
        let switches = schema();
        let usages: Vec<String> = switches.switches().iter().map(Switch::usage).collect();
        assert_eq!(usages, vec![
            "-s|--service <value> (required)",
            "-e|--env <value> (default: dev)",
            "--dry-run",
        ]);
    }
}
