use crate::mythic::{projection, MythicApi, MythicResult};
use crate::protocol::{SelectionParams, ToolResult};

/// Handle a `get_all_active_callbacks` tool call.
///
/// Unlike the other tools, a remote failure is not turned into a tool result:
/// the error is returned as-is and the dispatcher reports it as a JSON-RPC
/// internal error.
pub async fn handle(params: SelectionParams, api: &dyn MythicApi) -> MythicResult<ToolResult> {
    let fields = projection::CALLBACKS.select(params.custom_return_attributes.as_deref());
    let callbacks = api.get_all_active_callbacks(fields).await?;
    Ok(ToolResult::json(&callbacks))
}
