//! Authenticated connection to a Mythic server.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::api::{
    BuildParameter, C2ProfileSelection, MythicApi, PayloadCreated, PayloadDefinition, TaskRequest,
};
use super::error::{MythicError, MythicResult};
use super::graphql::{self, take_field, GraphQlResponse};
use super::subscription::Subscriber;
use crate::config::ServerConfig;

/// Reported to Mythic on login so operators can tell scripted sessions apart.
const SCRIPTING_VERSION: &str = concat!("mythic-mcp-server ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    #[serde(default)]
    user: Option<LoginUser>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    #[serde(default)]
    current_operation_id: Option<i64>,
}

/// `payloadDefinition` as Mythic's `createPayload` mutation parses it.
#[derive(Debug, Serialize)]
struct PayloadDefinitionBody<'a> {
    selected_os: &'a str,
    payload_type: &'a str,
    filename: &'a str,
    description: &'a str,
    commands: Vec<String>,
    build_parameters: &'a [BuildParameter],
    c2_profiles: &'a [C2ProfileSelection],
}

/// A logged-in Mythic API handle.
///
/// Created once by [`Session::login`] and shared read-only by every tool call.
/// The token is never refreshed.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    graphql_url: Url,
    subscriber: Subscriber,
    access_token: String,
    current_operation_id: Option<i64>,
}

impl Session {
    /// Authenticate with username/password and return a ready session.
    pub async fn login(config: &ServerConfig) -> MythicResult<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.request_timeout)
            .build()?;

        let base = Url::parse(&config.http_base())?;
        let auth_url = base.join("/auth")?;
        let graphql_url = base.join("/graphql/")?;
        let ws_url = Url::parse(&config.ws_base())?.join("/graphql/")?;

        let response = http
            .post(auth_url)
            .json(&json!({
                "username": config.username,
                "password": config.password,
                "scripting_version": SCRIPTING_VERSION,
            }))
            .send()
            .await
            .map_err(|e| MythicError::Authentication(format!("cannot reach {base}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MythicError::Authentication(e.to_string()))?;

        if !status.is_success() {
            return Err(MythicError::Authentication(format!(
                "server returned HTTP {status}: {}",
                body.trim()
            )));
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| MythicError::Authentication(format!("unexpected login response: {e}")))?;

        let access_token = match login.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                let reason = login
                    .error
                    .unwrap_or_else(|| "no access token in response".to_string());
                return Err(MythicError::Authentication(reason));
            }
        };
        let current_operation_id = login.user.and_then(|u| u.current_operation_id);

        info!(
            username = %config.username,
            server = %base,
            operation_id = ?current_operation_id,
            "authenticated to Mythic"
        );

        Ok(Self {
            http,
            graphql_url,
            subscriber: Subscriber::new(ws_url, access_token.clone(), config.verify_tls),
            access_token,
            current_operation_id,
        })
    }

    pub fn current_operation_id(&self) -> Option<i64> {
        self.current_operation_id
    }

    /// POST one query/mutation and return its `data`.
    pub async fn graphql(&self, query: &str, variables: Option<Value>) -> MythicResult<Value> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        debug!(url = %self.graphql_url, "graphql request");
        let response = self
            .http
            .post(self.graphql_url.clone())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<GraphQlResponse>(&text) {
            Ok(reply) if status.is_success() || reply.has_errors() => reply.into_data(),
            _ => Err(MythicError::GraphQl(format!("HTTP {status}: {}", text.trim()))),
        }
    }

    async fn create_task(&self, task: &TaskRequest) -> MythicResult<i64> {
        let variables = json!({
            "callback_display_id": task.callback_display_id,
            "command": task.command,
            "params": task.parameters.to_params_string()?,
            "token_id": task.token_id,
            "tasking_location": task.parameters.tasking_location(),
        });
        let data = self
            .graphql(graphql::CREATE_TASK_MUTATION, Some(variables))
            .await?;
        let created = take_field(data, "createTask")?;

        if created.get("status").and_then(Value::as_str) == Some("error") {
            let message = created
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("task creation failed");
            return Err(MythicError::Remote(message.to_string()));
        }

        created
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(MythicError::MissingData("createTask.id"))
    }

    async fn task_output(&self, task_id: i64) -> MythicResult<Option<String>> {
        let data = self
            .graphql(graphql::TASK_OUTPUT_QUERY, Some(json!({ "task_id": task_id })))
            .await?;
        decode_task_output(&take_field(data, "response")?)
    }

    /// Names of every command registered for a payload type.
    async fn command_names(&self, payload_type: &str) -> MythicResult<Vec<String>> {
        let commands = self.get_all_commands_for_payloadtype(payload_type, "cmd").await?;
        Ok(commands
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|c| c.get("cmd").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl MythicApi for Session {
    async fn get_all_commands_for_payloadtype(
        &self,
        payload_type: &str,
        fields: &str,
    ) -> MythicResult<Value> {
        let data = self
            .graphql(
                &graphql::commands_query(fields),
                Some(json!({ "payload_type_name": payload_type })),
            )
            .await?;
        take_field(data, "command")
    }

    async fn issue_task_and_wait_for_output(
        &self,
        task: &TaskRequest,
        timeout: Option<Duration>,
    ) -> MythicResult<Option<String>> {
        let task_id = self.create_task(task).await?;
        info!(
            task_id,
            command = %task.command,
            callback = task.callback_display_id,
            "task issued"
        );

        let wait = self.subscriber.wait_for(
            graphql::TASK_COMPLETE_SUBSCRIPTION,
            json!({ "task_id": task_id }),
            task_finished,
        );
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(finished) => {
                    finished?;
                }
                Err(_) => {
                    warn!(task_id, timeout_secs = limit.as_secs(), "task did not finish in time");
                    return Ok(None);
                }
            },
            None => {
                wait.await?;
            }
        }

        self.task_output(task_id).await
    }

    async fn execute_custom_query(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> MythicResult<Value> {
        self.graphql(query, variables).await
    }

    async fn get_all_active_callbacks(&self, fields: &str) -> MythicResult<Value> {
        let data = self
            .graphql(&graphql::active_callbacks_query(fields), None)
            .await?;
        take_field(data, "callback")
    }

    async fn get_all_tasks(
        &self,
        fields: &str,
        callback_display_id: Option<i64>,
    ) -> MythicResult<Value> {
        let data = match callback_display_id {
            Some(display_id) => {
                self.graphql(
                    &graphql::callback_tasks_query(fields),
                    Some(json!({ "callback_display_id": display_id })),
                )
                .await?
            }
            None => self.graphql(&graphql::all_tasks_query(fields), None).await?,
        };
        take_field(data, "task")
    }

    async fn get_all_payloads(&self, fields: &str) -> MythicResult<Value> {
        let data = self
            .graphql(&graphql::all_payloads_query(fields), None)
            .await?;
        take_field(data, "payload")
    }

    async fn create_payload(&self, definition: &PayloadDefinition) -> MythicResult<PayloadCreated> {
        let mut commands = definition.commands.clone();
        if definition.include_all_commands {
            for name in self.command_names(&definition.payload_type).await? {
                if !commands.contains(&name) {
                    commands.push(name);
                }
            }
        }

        let body = PayloadDefinitionBody {
            selected_os: &definition.selected_os,
            payload_type: &definition.payload_type,
            filename: &definition.filename,
            description: &definition.description,
            commands,
            build_parameters: &definition.build_parameters,
            c2_profiles: &definition.c2_profiles,
        };
        let variables = json!({ "payload": serde_json::to_string(&body)? });

        let data = self
            .graphql(graphql::CREATE_PAYLOAD_MUTATION, Some(variables))
            .await?;
        let created: PayloadCreated = serde_json::from_value(take_field(data, "createPayload")?)?;

        if created.status == "error" {
            return Err(MythicError::Remote(
                created
                    .error
                    .unwrap_or_else(|| "payload creation failed".to_string()),
            ));
        }
        info!(uuid = ?created.uuid, payload_type = %definition.payload_type, "payload build submitted");
        Ok(created)
    }

    async fn wait_for_payload_build(
        &self,
        uuid: &str,
        fields: &str,
        timeout: Option<Duration>,
    ) -> MythicResult<Value> {
        let document = graphql::payload_build_subscription(fields);
        let wait = self.subscriber.wait_for(
            &document,
            json!({ "uuid": uuid }),
            payload_build_finished,
        );
        let data = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| MythicError::Timeout(limit.as_secs()))??,
            None => wait.await?,
        };

        let mut payload = take_field(data, "payload")?
            .as_array_mut()
            .and_then(|payloads| payloads.pop())
            .ok_or(MythicError::MissingData("payload"))?;
        // `build_phase` is always subscribed to for the terminal check.
        if !graphql::selects_field(fields, "build_phase") {
            if let Some(object) = payload.as_object_mut() {
                object.remove("build_phase");
            }
        }
        Ok(payload)
    }
}

/// True once Mythic marks the task completed or errored.
fn task_finished(data: &Value) -> bool {
    let Some(task) = data.get("task_by_pk") else {
        return false;
    };
    let completed = task.get("completed").and_then(Value::as_bool).unwrap_or(false);
    let errored = task
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.starts_with("error"));
    completed || errored
}

/// True once the payload left the `building` phase.
fn payload_build_finished(data: &Value) -> bool {
    data.get("payload")
        .and_then(Value::as_array)
        .and_then(|payloads| payloads.first())
        .and_then(|p| p.get("build_phase"))
        .and_then(Value::as_str)
        .is_some_and(|phase| phase != "building")
}

/// Concatenate base64 `response_text` chunks in order.
///
/// `None` when the task produced no output at all.
fn decode_task_output(responses: &Value) -> MythicResult<Option<String>> {
    let mut bytes = Vec::new();
    for response in responses.as_array().into_iter().flatten() {
        if let Some(chunk) = response.get("response_text").and_then(Value::as_str) {
            bytes.extend(BASE64.decode(chunk)?);
        }
    }
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
