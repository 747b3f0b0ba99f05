//! Asynchronous half of an invocation.
//!
//! The ingress route acknowledges Slack within its deadline and hands the
//! invocation over as a wire record. The worker rebuilds the
//! [`CommandInput`], runs it and posts the result to the invocation's
//! response target.

use slack_bud_core::{CommandInput, ExecutionLocation, wire};
use tracing::{Instrument, info_span, instrument, warn};

use crate::error::AppError;
use crate::slack::SlackResponse;
use crate::state::AppState;

/// Run a serialized invocation in the background.
pub fn spawn(state: AppState, record: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, record).instrument(info_span!("worker")))
}

/// Run a serialized invocation and post its result.
///
/// Failures are reported and posted to the user; nothing is returned to
/// the caller.
pub async fn run(state: AppState, record: String) {
    let mut input = match wire::from_json(&record) {
        Ok(input) => input,
        Err(e) => {
            AppError::from(e).report();
            return;
        }
    };

    let response = match execute(&state, &mut input).await {
        Ok(response) => response,
        Err(e) => {
            e.report();
            e.user_response()
        }
    };

    let Some(target) = input.response_target() else {
        warn!("Invocation has no response target; dropping reply");
        return;
    };

    if let Err(e) = state.responses().send(target, &response).await {
        AppError::from(e).report();
    }
}

#[instrument(
    skip_all,
    fields(cmd = ?input.command(), confirmation = input.is_confirmation())
)]
async fn execute(state: &AppState, input: &mut CommandInput) -> Result<SlackResponse, AppError> {
    input.set_execution_location(ExecutionLocation::Async)?;

    let response = state
        .dispatcher()
        .dispatch(input, state.sessions())
        .await?;
    Ok(response)
}
