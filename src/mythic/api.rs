//! The operations every tool handler runs against.
//!
//! [`MythicApi`] is implemented by the authenticated [`Session`](super::Session)
//! and by test doubles. Handlers only see `&dyn MythicApi`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::MythicResult;

/// Task parameters, either a JSON object keyed by parameter `name`, or
/// flag-style command-line text keyed by `cli_name` (`-path /etc/issue`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskParameters {
    Text(String),
    Structured(serde_json::Map<String, Value>),
}

impl TaskParameters {
    /// The `params` string Mythic's `createTask` mutation expects.
    pub fn to_params_string(&self) -> MythicResult<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Structured(map) => Ok(serde_json::to_string(map)?),
        }
    }

    /// Where Mythic should treat the tasking as coming from.
    pub fn tasking_location(&self) -> &'static str {
        match self {
            Self::Text(_) => "command_line",
            Self::Structured(_) => "scripting",
        }
    }
}

/// A task to issue against one callback.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    pub command: String,
    pub parameters: TaskParameters,
    pub callback_display_id: i64,
    pub token_id: Option<i64>,
}

/// One C2 profile selection inside a payload definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C2ProfileSelection {
    pub c2_profile: String,
    #[serde(default)]
    pub c2_profile_parameters: serde_json::Map<String, Value>,
}

/// One build parameter inside a payload definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParameter {
    pub name: String,
    pub value: Value,
}

/// Everything Mythic needs to start a payload build.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadDefinition {
    pub payload_type: String,
    pub filename: String,
    pub selected_os: String,
    pub description: String,
    pub c2_profiles: Vec<C2ProfileSelection>,
    pub commands: Vec<String>,
    pub build_parameters: Vec<BuildParameter>,
    pub include_all_commands: bool,
}

/// Envelope returned by `createPayload` before the build finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadCreated {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[async_trait]
pub trait MythicApi: Send + Sync {
    /// Commands (and their parameters) registered for a payload type.
    async fn get_all_commands_for_payloadtype(
        &self,
        payload_type: &str,
        fields: &str,
    ) -> MythicResult<Value>;

    /// Issue a task and wait for it to finish.
    ///
    /// Returns `Ok(None)` when the task produced no output or the wait timed
    /// out; the text otherwise (binary output is decoded lossily).
    async fn issue_task_and_wait_for_output(
        &self,
        task: &TaskRequest,
        timeout: Option<Duration>,
    ) -> MythicResult<Option<String>>;

    /// Run a query or mutation verbatim and return its `data`.
    async fn execute_custom_query(&self, query: &str, variables: Option<Value>)
        -> MythicResult<Value>;

    async fn get_all_active_callbacks(&self, fields: &str) -> MythicResult<Value>;

    async fn get_all_tasks(&self, fields: &str, callback_display_id: Option<i64>)
        -> MythicResult<Value>;

    async fn get_all_payloads(&self, fields: &str) -> MythicResult<Value>;

    /// Submit a payload build. Does not wait for it.
    async fn create_payload(&self, definition: &PayloadDefinition) -> MythicResult<PayloadCreated>;

    /// Wait until the build for `uuid` leaves the `building` phase and return
    /// the payload's attributes.
    async fn wait_for_payload_build(
        &self,
        uuid: &str,
        fields: &str,
        timeout: Option<Duration>,
    ) -> MythicResult<Value>;
}
