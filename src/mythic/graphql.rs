//! GraphQL documents sent to Mythic and the response envelope they come back in.

use serde::Deserialize;
use serde_json::Value;

use super::error::{MythicError, MythicResult};

/// Standard GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
}

impl GraphQlResponse {
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Return `data`, or the joined error messages if the server reported any.
    pub fn into_data(self) -> MythicResult<Value> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(MythicError::GraphQl(joined));
        }
        self.data.ok_or(MythicError::MissingData("data"))
    }
}

/// Move `key` out of a `data` object.
pub fn take_field(mut data: Value, key: &'static str) -> MythicResult<Value> {
    data.get_mut(key)
        .map(Value::take)
        .ok_or(MythicError::MissingData(key))
}

pub fn commands_query(fields: &str) -> String {
    format!(
        "query GetAllCommandsForPayloadType($payload_type_name: String!) {{
  command(where: {{payloadtype: {{name: {{_eq: $payload_type_name}}}}, deleted: {{_eq: false}}}}, order_by: {{cmd: asc}}) {{
{fields}
  }}
}}"
    )
}

pub fn active_callbacks_query(fields: &str) -> String {
    format!(
        "query CurrentCallbacks {{
  callback(where: {{active: {{_eq: true}}}}, order_by: {{id: asc}}) {{
{fields}
  }}
}}"
    )
}

pub fn all_tasks_query(fields: &str) -> String {
    format!(
        "query AllTasks {{
  task(order_by: {{id: asc}}) {{
{fields}
  }}
}}"
    )
}

pub fn callback_tasks_query(fields: &str) -> String {
    format!(
        "query CallbackTasks($callback_display_id: Int!) {{
  task(where: {{callback: {{display_id: {{_eq: $callback_display_id}}}}}}, order_by: {{id: asc}}) {{
{fields}
  }}
}}"
    )
}

pub fn all_payloads_query(fields: &str) -> String {
    format!(
        "query AllPayloads {{
  payload(order_by: {{id: asc}}) {{
{fields}
  }}
}}"
    )
}

pub fn payload_build_subscription(fields: &str) -> String {
    format!(
        "subscription WaitForPayloadBuild($uuid: String!) {{
  payload(where: {{uuid: {{_eq: $uuid}}}}) {{
    build_phase
{fields}
  }}
}}"
    )
}

/// Whether `name` appears as a field anywhere in a selection set.
pub fn selects_field(fields: &str, name: &str) -> bool {
    fields
        .split(|c: char| c.is_whitespace() || c == '{' || c == '}' || c == ',')
        .any(|token| token == name)
}

pub const CREATE_TASK_MUTATION: &str = "mutation createTasking($callback_display_id: Int!, $command: String!, $params: String!, $token_id: Int, $tasking_location: String) {
  createTask(callback_display_id: $callback_display_id, command: $command, params: $params, token_id: $token_id, tasking_location: $tasking_location) {
    status
    id
    display_id
    error
  }
}";

pub const TASK_COMPLETE_SUBSCRIPTION: &str = "subscription WaitForTaskComplete($task_id: Int!) {
  task_by_pk(id: $task_id) {
    id
    status
    completed
  }
}";

pub const TASK_OUTPUT_QUERY: &str = "query TaskOutput($task_id: Int!) {
  response(where: {task_id: {_eq: $task_id}}, order_by: {id: asc}) {
    response_text
  }
}";

pub const CREATE_PAYLOAD_MUTATION: &str = "mutation createPayloadMutation($payload: String!) {
  createPayload(payloadDefinition: $payload) {
    error
    status
    uuid
  }
}";
