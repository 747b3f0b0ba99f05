//! Slack message builders for the command and confirmation flow.
//!
//! Provides factory functions for:
//! - The synchronous acknowledgement of a slash command or click
//! - Confirmation prompts carrying a correlatable callback id
//! - Cancellation and error replies

use slack_bud_core::{CallbackId, CommandInput};

use super::types::{Attachment, AttachmentAction, ButtonStyle, SlackResponse};
use crate::dispatch::ConfirmationPrompt;

/// Button value of the confirming button.
pub const CONFIRM_VALUE: &str = "yes";

/// Button value of the declining button.
pub const DENY_VALUE: &str = "no";

/// Acknowledge an invocation while the worker runs it.
#[must_use]
pub fn build_ack_response(input: &CommandInput) -> SlackResponse {
    let what = match (input.command(), input.sub_command()) {
        (Some(cmd), Some(sub)) if !sub.is_default() => format!("`{cmd} {sub}`"),
        (Some(cmd), _) => format!("`{cmd}`"),
        (None, _) => "your request".to_string(),
    };

    let mut response = SlackResponse::ephemeral(format!("Working on {what}..."));
    if input.is_confirmation() {
        response = response.replacing_original();
    }
    response
}

/// Build a confirmation prompt.
///
/// The attachment's `fallback` is the prompting command's marker and its
/// `callback_id` is returned when a button is clicked.
#[must_use]
pub fn build_prompt_response(prompt: &ConfirmationPrompt, callback_id: &CallbackId) -> SlackResponse {
    let attachment = Attachment {
        fallback: callback_id.fallback.clone(),
        callback_id: callback_id.to_string(),
        text: prompt.detail.clone(),
        color: Some("#3AA3E3".to_string()),
        attachment_type: "default",
        actions: vec![
            AttachmentAction::button(
                prompt.action_name().to_string(),
                prompt.confirm_label.clone(),
                CONFIRM_VALUE,
                Some(ButtonStyle::Primary),
            ),
            AttachmentAction::button(
                prompt.action_name().to_string(),
                prompt.deny_label.clone(),
                DENY_VALUE,
                Some(ButtonStyle::Danger),
            ),
        ],
    };

    SlackResponse::ephemeral(prompt.text.clone()).with_attachment(attachment)
}

/// Reply to a declined prompt.
#[must_use]
pub fn build_cancelled_response(command: &str) -> SlackResponse {
    SlackResponse::ephemeral(format!("Cancelled `{command}`.")).replacing_original()
}

/// Reply describing a failure.
#[must_use]
pub fn build_error_response(message: &str) -> SlackResponse {
    SlackResponse::ephemeral(format!(":warning: {message}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use slack_bud_core::{SessionId, SubCommand};

    use super::*;

    #[test]
    fn test_prompt_has_two_buttons() {
        let prompt = ConfirmationPrompt::new("Set maxRetries to 3 on content?", "confirm");
        let callback_id = CallbackId::new(SubCommand::named("set"), "CmdProps")
            .with_action("confirm")
            .with_session(SessionId::new("ab12"));

        let response = build_prompt_response(&prompt, &callback_id);
        assert!(response.is_ephemeral());

        let attachment = response.attachments.first().unwrap();
        assert_eq!(attachment.fallback, "CmdProps");
        assert_eq!(attachment.callback_id, "callback_set_CmdProps_confirm_ab12");
        assert_eq!(attachment.actions.len(), 2);
        assert_eq!(attachment.actions[0].value, CONFIRM_VALUE);
        assert_eq!(attachment.actions[1].value, DENY_VALUE);
    }

    #[test]
    fn test_blank_action_buttons_use_default_name() {
        let prompt = ConfirmationPrompt::new("Restart content?", " ");
        let callback_id = CallbackId::new(SubCommand::named("restart"), "CmdService")
            .with_action(prompt.action_name())
            .with_session(SessionId::new("cd34"));

        let response = build_prompt_response(&prompt, &callback_id);
        let attachment = response.attachments.first().unwrap();
        assert_eq!(attachment.callback_id, "callback_restart_CmdService_confirm_cd34");
        assert!(attachment.actions.iter().all(|a| a.name == "confirm"));
    }

    #[test]
    fn test_prompt_serializes_legacy_shape() {
        let prompt = ConfirmationPrompt::new("Deploy?", "deploy");
        let callback_id = CallbackId::new(SubCommand::Default, "CmdDeploy");
        let json = serde_json::to_value(build_prompt_response(&prompt, &callback_id)).unwrap();

        assert_eq!(json["response_type"], "ephemeral");
        assert_eq!(json["attachments"][0]["fallback"], "CmdDeploy");
        assert_eq!(json["attachments"][0]["actions"][0]["type"], "button");
        assert!(json.get("replace_original").is_none());
    }

    #[test]
    fn test_ack_mentions_command() {
        let input = CommandInput::from_text("props list -s content", "dev").unwrap();
        assert_eq!(build_ack_response(&input).text, "Working on `props list`...");

        let input = CommandInput::from_text("", "dev").unwrap();
        assert_eq!(build_ack_response(&input).text, "Working on your request...");
    }

    #[test]
    fn test_cancelled_replaces_original() {
        let response = build_cancelled_response("props");
        assert!(response.replace_original);
        assert!(response.text.contains("props"));
    }
}
