use serde::{Deserialize, Serialize};

use crate::mythic::{BuildParameter, C2ProfileSelection, TaskParameters};

/// JSON-RPC 2.0 ID, either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// Parameters for `get_all_commands_for_payloadtype`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetCommandsParams {
    pub payload: String,
    #[serde(default)]
    pub custom_return_attributes: Option<String>,
}

/// Parameters for `issue_task_and_waitfor_task_output`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTaskParams {
    pub command: String,
    pub parameters: TaskParameters,
    pub callback_display_id: i64,
    #[serde(default)]
    pub token_id: Option<i64>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Parameters for `execute_graphql_query`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteQueryParams {
    pub query: String,
    #[serde(default)]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Parameters for the listing tools that only take a field selection
/// (`get_all_active_callbacks`, `get_all_payloads`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionParams {
    #[serde(default)]
    pub custom_return_attributes: Option<String>,
}

/// Parameters for `get_all_tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetTasksParams {
    #[serde(default)]
    pub custom_return_attributes: Option<String>,
    #[serde(default)]
    pub callback_display_id: Option<i64>,
}

/// Parameters for `create_payload`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayloadParams {
    pub payload_type_name: String,
    pub filename: String,
    pub operating_system: String,
    pub c2_profiles: Vec<C2ProfileSelection>,
    #[serde(default)]
    pub commands: Option<Vec<String>>,
    pub build_parameters: Vec<BuildParameter>,
    pub description: String,
    #[serde(default = "default_true")]
    pub return_on_complete: bool,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub custom_return_attributes: Option<String>,
    #[serde(default = "default_true")]
    pub include_all_commands: bool,
}

fn default_true() -> bool {
    true
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}
