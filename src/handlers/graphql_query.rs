use serde_json::Value;
use tracing::warn;

use crate::handlers::catalog::EXECUTE_QUERY;
use crate::mythic::MythicApi;
use crate::protocol::{ExecuteQueryParams, ToolResult};

/// Handle an `execute_graphql_query` tool call. The query is sent verbatim.
pub async fn handle(params: ExecuteQueryParams, api: &dyn MythicApi) -> ToolResult {
    let variables = params.variables.map(Value::Object);

    match api.execute_custom_query(&params.query, variables).await {
        Ok(data) => ToolResult::json(&data),
        Err(e) => {
            warn!(tool = EXECUTE_QUERY, error = %e, "remote call failed");
            ToolResult::error(format!("Error executing query: {e}"))
        }
    }
}
