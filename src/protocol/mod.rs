pub mod request;
pub mod response;

pub use request::{
    ClientInfo, CreatePayloadParams, ExecuteQueryParams, GetCommandsParams, GetTasksParams,
    InitializeParams, IssueTaskParams, JsonRpcRequest, RpcId, SelectionParams, ToolCallParams,
};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};
