//! Recording stand-in for the Mythic session.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mythic_mcp_server::mythic::{
    MythicApi, MythicError, MythicResult, PayloadCreated, PayloadDefinition, TaskRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Commands { payload_type: String, fields: String },
    IssueTask { task: TaskRequest, timeout: Option<Duration> },
    Query { query: String, variables: Option<Value> },
    Callbacks { fields: String },
    Tasks { fields: String, callback_display_id: Option<i64> },
    Payloads { fields: String },
    CreatePayload(PayloadDefinition),
    WaitForPayload { uuid: String, fields: String, timeout: Option<Duration> },
}

pub struct FakeMythic {
    failure: Option<String>,
    response: Value,
    task_output: Option<String>,
    built_payload: Value,
    calls: Mutex<Vec<Call>>,
}

impl FakeMythic {
    /// Every call succeeds; queries return `response`.
    pub fn returning(response: Value) -> Self {
        Self {
            failure: None,
            response,
            task_output: None,
            built_payload: json!({"uuid": "b1c2", "build_phase": "success"}),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a GraphQL error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::returning(Value::Null)
        }
    }

    pub fn with_task_output(mut self, output: Option<&str>) -> Self {
        self.task_output = output.map(str::to_string);
        self
    }

    pub fn with_built_payload(mut self, payload: Value) -> Self {
        self.built_payload = payload;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> MythicResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(MythicError::GraphQl(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MythicApi for FakeMythic {
    async fn get_all_commands_for_payloadtype(
        &self,
        payload_type: &str,
        fields: &str,
    ) -> MythicResult<Value> {
        self.record(Call::Commands {
            payload_type: payload_type.to_string(),
            fields: fields.to_string(),
        })?;
        Ok(self.response.clone())
    }

    async fn issue_task_and_wait_for_output(
        &self,
        task: &TaskRequest,
        timeout: Option<Duration>,
    ) -> MythicResult<Option<String>> {
        self.record(Call::IssueTask {
            task: task.clone(),
            timeout,
        })?;
        Ok(self.task_output.clone())
    }

    async fn execute_custom_query(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> MythicResult<Value> {
        self.record(Call::Query {
            query: query.to_string(),
            variables,
        })?;
        Ok(self.response.clone())
    }

    async fn get_all_active_callbacks(&self, fields: &str) -> MythicResult<Value> {
        self.record(Call::Callbacks {
            fields: fields.to_string(),
        })?;
        Ok(self.response.clone())
    }

    async fn get_all_tasks(
        &self,
        fields: &str,
        callback_display_id: Option<i64>,
    ) -> MythicResult<Value> {
        self.record(Call::Tasks {
            fields: fields.to_string(),
            callback_display_id,
        })?;
        Ok(self.response.clone())
    }

    async fn get_all_payloads(&self, fields: &str) -> MythicResult<Value> {
        self.record(Call::Payloads {
            fields: fields.to_string(),
        })?;
        Ok(self.response.clone())
    }

    async fn create_payload(&self, definition: &PayloadDefinition) -> MythicResult<PayloadCreated> {
        self.record(Call::CreatePayload(definition.clone()))?;
        Ok(PayloadCreated {
            status: "success".to_string(),
            error: None,
            uuid: Some("b1c2".to_string()),
        })
    }

    async fn wait_for_payload_build(
        &self,
        uuid: &str,
        fields: &str,
        timeout: Option<Duration>,
    ) -> MythicResult<Value> {
        self.record(Call::WaitForPayload {
            uuid: uuid.to_string(),
            fields: fields.to_string(),
            timeout,
        })?;
        Ok(self.built_payload.clone())
    }
}
