use tracing::warn;

use crate::handlers::catalog::GET_COMMANDS;
use crate::mythic::{projection, MythicApi};
use crate::protocol::{GetCommandsParams, ToolResult};

/// Handle a `get_all_commands_for_payloadtype` tool call.
pub async fn handle(params: GetCommandsParams, api: &dyn MythicApi) -> ToolResult {
    let fields = projection::COMMANDS.select(params.custom_return_attributes.as_deref());

    match api.get_all_commands_for_payloadtype(&params.payload, fields).await {
        Ok(commands) => ToolResult::json(&commands),
        Err(e) => {
            warn!(tool = GET_COMMANDS, payload = %params.payload, error = %e, "remote call failed");
            ToolResult::error(format!(
                "Error getting commands for payload type {}: {e}",
                params.payload
            ))
        }
    }
}
