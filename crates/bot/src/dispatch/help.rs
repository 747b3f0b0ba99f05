//! Built-in `help` command.

use std::fmt::Write as _;

use async_trait::async_trait;
use slack_bud_core::{CommandInput, Switch};

use super::{CommandHandler, DispatchError, HandlerOutcome};

pub(super) const HELP_COMMAND: &str = "help";

/// What `help` knows about one registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub name: String,
    pub description: String,
    pub sub_commands: Vec<String>,
    pub switches: Vec<String>,
}

impl HelpEntry {
    pub(super) fn of(handler: &dyn CommandHandler) -> Self {
        Self {
            name: handler.name().to_string(),
            description: handler.description().to_string(),
            sub_commands: handler
                .sub_commands()
                .iter()
                .map(ToString::to_string)
                .collect(),
            switches: handler
                .schema(None)
                .switches()
                .iter()
                .map(Switch::usage)
                .collect(),
        }
    }
}

/// Lists commands, or describes one (`help props`).
#[derive(Debug, Clone)]
pub struct HelpHandler {
    entries: Vec<HelpEntry>,
}

impl HelpHandler {
    #[must_use]
    pub const fn new(entries: Vec<HelpEntry>) -> Self {
        Self { entries }
    }

    fn listing(&self) -> String {
        let mut text = String::from("*Commands*\n");
        for entry in &self.entries {
            let _ = writeln!(text, "• `{}` {}", entry.name, entry.description);
        }
        let _ = write!(text, "• `{HELP_COMMAND}` Show this list, or `help <command>`");
        text
    }

    fn describe(entry: &HelpEntry) -> String {
        let mut text = format!("*{}* {}", entry.name, entry.description);
        if !entry.sub_commands.is_empty() {
            let _ = write!(text, "\nSub-commands: {}", entry.sub_commands.join(", "));
        }
        for switch in &entry.switches {
            let _ = write!(text, "\n  `{switch}`");
        }
        text
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &'static str {
        HELP_COMMAND
    }

    fn description(&self) -> &'static str {
        "List commands"
    }

    async fn handle(&self, input: &mut CommandInput) -> Result<HandlerOutcome, DispatchError> {
        let topic = input.by_index(1).map(str::to_lowercase);
        let text = match topic.and_then(|t| self.entries.iter().find(|e| e.name == t)) {
            Some(entry) => Self::describe(entry),
            None => self.listing(),
        };
        Ok(HandlerOutcome::Reply(text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn handler() -> HelpHandler {
        HelpHandler::new(vec![HelpEntry {
            name: "props".to_string(),
            description: "Read and change service properties".to_string(),
            sub_commands: vec!["list".to_string(), "set".to_string()],
            switches: vec!["-s|--service <value> (required)".to_string()],
        }])
    }

    async fn reply(text: &str) -> String {
        let mut input = CommandInput::from_text(text, "dev").unwrap();
        match handler().handle(&mut input).await.unwrap() {
            HandlerOutcome::Reply(text) => text,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listing() {
        let text = reply("help").await;
        assert!(text.contains("`props` Read and change service properties"));
        assert!(text.contains("`help`"));
    }

    #[tokio::test]
    async fn test_describe_command() {
        let text = reply("help Props").await;
        assert!(text.starts_with("*props*"));
        assert!(text.contains("list, set"));
        assert!(text.contains("--service"));
    }

    #[tokio::test]
    async fn test_unknown_topic_lists() {
        assert!(reply("help nope").await.starts_with("*Commands*"));
    }
}
