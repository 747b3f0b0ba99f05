//! Unified error handling for the bot.
//!
//! Every failure that reaches a user passes through [`AppError`]. Failures
//! of the user's own invocation (unknown command, bad switches, expired
//! prompt) become an ephemeral Slack message with status 200, since Slack
//! shows nothing to the user for any other status. Only signature and
//! transport failures use HTTP error statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use slack_bud_core::CommandInputError;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::slack::{SlackError, SlackResponse, build_error_response};

/// Application-level error type for the bot.
#[derive(Debug, Error)]
pub enum AppError {
    /// The invocation could not be parsed or correlated.
    #[error(transparent)]
    Protocol(#[from] CommandInputError),

    /// The invocation could not be routed or its handler failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Talking to Slack failed.
    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),

    /// The request was not signed by Slack.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is a server fault rather than a user mistake.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_) | Self::Slack(_) | Self::Dispatch(DispatchError::Handler(_))
        )
    }

    /// The ephemeral Slack message describing this error.
    #[must_use]
    pub fn user_response(&self) -> SlackResponse {
        let message = match self {
            Self::Protocol(e) => e.user_message(),
            Self::Dispatch(e) => e.user_message(),
            Self::Slack(_) | Self::Internal(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            Self::Unauthorized(_) | Self::BadRequest(_) => self.to_string(),
        };
        build_error_response(&message)
    }

    /// Log the error, forwarding server faults to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::info!(error = %self, "Command rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        match &self {
            Self::Protocol(_) | Self::Dispatch(_) => {
                (StatusCode::OK, Json(self.user_response())).into_response()
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            // Don't expose internal error details to clients
            Self::Slack(_) => (StatusCode::BAD_GATEWAY, "External service error").into_response(),
            Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("missing body".to_string());
        assert_eq!(err.to_string(), "Bad request: missing body");

        let err = AppError::Protocol(CommandInputError::UnresolvedFallback);
        assert_eq!(
            err.to_string(),
            CommandInputError::UnresolvedFallback.to_string()
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Protocol(CommandInputError::UnresolvedFallback)),
            StatusCode::OK
        );
        assert_eq!(
            get_status(AppError::Dispatch(DispatchError::NoCommand)),
            StatusCode::OK
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Slack(SlackError::Request("test".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_response_is_ephemeral() {
        let err = AppError::Dispatch(DispatchError::UnknownCommand {
            command: "deploy".to_string(),
            available: vec!["help".to_string()],
        });
        let response = err.user_response();
        assert!(response.is_ephemeral());
        assert!(response.text.contains("Unknown command `deploy`"));
        assert!(response.text.contains("help"));
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("db password leaked".to_string());
        assert!(!err.user_response().text.contains("password"));
        assert!(err.is_server_error());
    }
}
