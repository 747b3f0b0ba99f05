//! Slack plumbing for slash commands and interactive prompts.
//!
//! This module provides:
//! - [`SignatureVerifier`] for authenticating inbound requests
//! - [`ResponseChannel`] for posting follow-up messages
//! - Legacy attachment types for confirmation prompts
//! - Message builders for acknowledgements, prompts and errors
//!
//! # Flow
//!
//! 1. A slash command arrives, is verified and acknowledged
//! 2. The worker runs it; a handler may answer with a confirmation prompt
//! 3. The user clicks a button; Slack posts the prompt's callback id back
//! 4. The click is correlated to the original command and confirmed
//! 5. The result is posted to the click's `response_url`

mod error;
mod messages;
mod response;
mod signature;
mod types;

pub use error::SlackError;
pub use messages::{
    CONFIRM_VALUE, DENY_VALUE, build_ack_response, build_cancelled_response,
    build_error_response, build_prompt_response,
};
pub use response::{ResponseChannel, ResponseSink};
pub use signature::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};
pub use types::{Attachment, AttachmentAction, ButtonStyle, ResponseType, SlackResponse};
