use tracing::warn;

use crate::handlers::catalog::GET_TASKS;
use crate::mythic::{projection, MythicApi};
use crate::protocol::{GetTasksParams, ToolResult};

/// Handle a `get_all_tasks` tool call.
///
/// The callback filter is only applied when `callback_display_id` is given.
pub async fn handle(params: GetTasksParams, api: &dyn MythicApi) -> ToolResult {
    let fields = projection::TASKS.select(params.custom_return_attributes.as_deref());

    match api.get_all_tasks(fields, params.callback_display_id).await {
        Ok(tasks) => ToolResult::json(&tasks),
        Err(e) => {
            warn!(tool = GET_TASKS, callback = ?params.callback_display_id, error = %e, "remote call failed");
            ToolResult::error(format!("Error getting tasks: {e}"))
        }
    }
}
