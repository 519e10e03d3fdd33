pub mod callbacks;
pub mod catalog;
pub mod commands;
pub mod graphql_query;
pub mod introspection;
pub mod issue_task;
pub mod payloads;
pub mod tasks;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info};

use crate::mythic::{MythicApi, MythicResult};
use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult,
};
use crate::schema;

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(req: &JsonRpcRequest, api: &dyn MythicApi) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = req
                .params
                .as_ref()
                .and_then(|v| serde_json::from_value::<InitializeParams>(v.clone()).ok())
            {
                let client = params.client_info.as_ref();
                info!(
                    protocol_version = ?params.protocol_version,
                    client = ?client.and_then(|c| c.name.as_deref()),
                    client_version = ?client.and_then(|c| c.version.as_deref()),
                    "client initializing"
                );
            }

            let result = serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "mythic-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "notifications/initialized" => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => {
            let result = serde_json::json!({ "tools": catalog::tool_definitions() });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            JsonRpcError::invalid_params(format!(
                                "Invalid tools/call params: {e}"
                            )),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            match dispatch_tool_call(&params, api).await {
                Ok(tool_result) => match serde_json::to_value(&tool_result) {
                    Ok(result_json) => Some(JsonRpcResponse::success(req.id.clone(), result_json)),
                    Err(e) => Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::internal_error(format!("Cannot serialize tool result: {e}")),
                    )),
                },
                Err(e) => {
                    error!(tool = %params.name, error = %e, "tool call failed");
                    Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::internal_error(e.to_string()),
                    ))
                }
            }
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

/// Run one tool. Only `get_all_active_callbacks` can return `Err`.
async fn dispatch_tool_call(
    params: &ToolCallParams,
    api: &dyn MythicApi,
) -> MythicResult<ToolResult> {
    let args = params.arguments.as_ref();

    let result = match params.name.as_str() {
        catalog::GET_COMMANDS => match parse_arguments(catalog::GET_COMMANDS, args) {
            Ok(p) => commands::handle(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::ISSUE_TASK => match parse_arguments(catalog::ISSUE_TASK, args) {
            Ok(p) => issue_task::handle(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::EXECUTE_QUERY => match parse_arguments(catalog::EXECUTE_QUERY, args) {
            Ok(p) => graphql_query::handle(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::ACTIVE_CALLBACKS => match parse_arguments(catalog::ACTIVE_CALLBACKS, args) {
            Ok(p) => callbacks::handle(p, api).await?,
            Err(invalid) => invalid,
        },

        catalog::GET_TASKS => match parse_arguments(catalog::GET_TASKS, args) {
            Ok(p) => tasks::handle(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::GET_PAYLOADS => match parse_arguments(catalog::GET_PAYLOADS, args) {
            Ok(p) => payloads::handle_list(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::CREATE_PAYLOAD => match parse_arguments(catalog::CREATE_PAYLOAD, args) {
            Ok(p) => payloads::handle_create(p, api).await,
            Err(invalid) => invalid,
        },

        catalog::INTROSPECT_SCHEMA => introspection::handle_schema(api).await,
        catalog::INTROSPECT_MUTATIONS => introspection::handle_mutations(api).await,
        catalog::INTROSPECT_TYPES => introspection::handle_types(api).await,

        _ => ToolResult::error(format!("Unknown tool: {}", params.name)),
    };

    Ok(result)
}

/// Check `arguments` against the tool's input schema, then deserialize.
///
/// Absent arguments are treated as `{}` for tools without required fields.
fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Option<&Value>) -> Result<T, ToolResult> {
    let schema = catalog::input_schema(tool);

    let arguments = match arguments {
        Some(v) => v.clone(),
        None => {
            let requires_any = schema
                .as_ref()
                .and_then(|s| s.get("required"))
                .and_then(Value::as_array)
                .is_some_and(|r| !r.is_empty());
            if requires_any {
                return Err(ToolResult::error(format!("Missing arguments for {tool}")));
            }
            Value::Object(Default::default())
        }
    };

    if let Some(schema) = schema {
        if let Err(e) = schema::validate(&schema, &arguments) {
            return Err(ToolResult::error(format!("Invalid arguments for {tool}: {e}")));
        }
    }

    serde_json::from_value(arguments)
        .map_err(|e| ToolResult::error(format!("Invalid arguments for {tool}: {e}")))
}
