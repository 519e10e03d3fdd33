use std::time::Duration;

use tracing::warn;

use crate::handlers::catalog::ISSUE_TASK;
use crate::mythic::{MythicApi, TaskRequest};
use crate::protocol::{IssueTaskParams, ToolResult};

/// Returned when the task finished (or the wait timed out) without output.
pub const NO_RESULTS: &str = "No results returned from task.";

/// Handle an `issue_task_and_waitfor_task_output` tool call.
///
/// Blocks until Mythic reports the task complete or `timeout` elapses. A
/// timeout is indistinguishable from an empty result: both yield
/// [`NO_RESULTS`].
pub async fn handle(params: IssueTaskParams, api: &dyn MythicApi) -> ToolResult {
    let timeout = params.timeout.map(Duration::from_secs);
    let task = TaskRequest {
        command: params.command,
        parameters: params.parameters,
        callback_display_id: params.callback_display_id,
        token_id: params.token_id,
    };

    match api.issue_task_and_wait_for_output(&task, timeout).await {
        Ok(Some(output)) => ToolResult::text(output),
        Ok(None) => ToolResult::text(NO_RESULTS),
        Err(e) => {
            warn!(
                tool = ISSUE_TASK,
                command = %task.command,
                callback = task.callback_display_id,
                error = %e,
                "remote call failed"
            );
            ToolResult::error(format!(
                "Error issuing command '{}' to agent {}: {e}",
                task.command, task.callback_display_id
            ))
        }
    }
}
