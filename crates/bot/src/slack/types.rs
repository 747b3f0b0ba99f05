//! Slack message payloads posted to `response_url`.
//!
//! Prompts use the legacy attachment format: the attachment's `fallback`
//! names the prompting command and its `callback_id` is returned verbatim
//! when a button is clicked.
//!
//! See: <https://api.slack.com/legacy/interactive-messages>

use serde::Serialize;

/// Who can see a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Only the invoking user.
    Ephemeral,
    /// Everyone in the channel.
    InChannel,
}

/// A message for a `response_url` or a synchronous reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackResponse {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub replace_original: bool,
}

impl SlackResponse {
    /// A private response.
    #[must_use]
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
            attachments: Vec::new(),
            replace_original: false,
        }
    }

    /// A channel-visible response.
    #[must_use]
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            ..Self::ephemeral(text)
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Replace the message the user clicked on.
    #[must_use]
    pub const fn replacing_original(mut self) -> Self {
        self.replace_original = true;
        self
    }

    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.response_type == ResponseType::Ephemeral
    }
}

/// Legacy message attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub callback_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub attachment_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
}

/// Interactive button of a legacy attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
}

impl AttachmentAction {
    /// A button that sends `value` back when clicked.
    #[must_use]
    pub fn button(
        name: impl Into<String>,
        text: impl Into<String>,
        value: impl Into<String>,
        style: Option<ButtonStyle>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            action_type: "button",
            value: value.into(),
            style,
        }
    }
}

/// Button style (affects color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    /// Green primary button.
    Primary,
    /// Red danger button.
    Danger,
}
