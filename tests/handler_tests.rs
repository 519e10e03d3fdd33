//! Tool handler tests.
//!
//! Handlers run against a recording fake session so each test can check both
//! the tool output and exactly what was asked of Mythic.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{Call, FakeMythic};
use mythic_mcp_server::handlers::{
    callbacks, commands, graphql_query, introspection, issue_task, payloads, tasks,
};
use mythic_mcp_server::mythic::projection;
use mythic_mcp_server::mythic::{
    BuildParameter, C2ProfileSelection, MythicError, TaskParameters, TaskRequest,
};
use mythic_mcp_server::protocol::{
    CreatePayloadParams, ExecuteQueryParams, GetCommandsParams, GetTasksParams, IssueTaskParams,
    SelectionParams, ToolResult,
};

fn task_params(parameters: TaskParameters, timeout: Option<u64>) -> IssueTaskParams {
    IssueTaskParams {
        command: "shell".to_string(),
        parameters,
        callback_display_id: 7,
        token_id: None,
        timeout,
    }
}

fn payload_params(return_on_complete: bool) -> CreatePayloadParams {
    CreatePayloadParams {
        payload_type_name: "poseidon".to_string(),
        filename: "agent.bin".to_string(),
        operating_system: "Linux".to_string(),
        c2_profiles: vec![C2ProfileSelection {
            c2_profile: "http".to_string(),
            c2_profile_parameters: serde_json::from_value(json!({"callback_port": 443})).unwrap(),
        }],
        commands: None,
        build_parameters: vec![BuildParameter {
            name: "mode".to_string(),
            value: json!("default"),
        }],
        description: "test build".to_string(),
        return_on_complete,
        timeout: Some(120),
        custom_return_attributes: None,
        include_all_commands: true,
    }
}

fn assert_failure(result: &ToolResult, expected_prefix: &str) {
    assert!(result.is_error, "expected an error result, got {result:?}");
    let text = result.first_text();
    assert!(
        text.starts_with(expected_prefix),
        "'{text}' should start with '{expected_prefix}'"
    );
    assert!(text.contains("connection refused"), "'{text}' should carry the cause");
}

// ---------------------------------------------------------------------------
// Failure formatting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remote_failures_become_descriptive_tool_errors() {
    let api = FakeMythic::failing("connection refused");

    let result = commands::handle(
        GetCommandsParams {
            payload: "apfell".to_string(),
            custom_return_attributes: None,
        },
        &api,
    )
    .await;
    assert_failure(&result, "Error getting commands for payload type apfell: ");

    let result = issue_task::handle(task_params(TaskParameters::Text("whoami".into()), None), &api).await;
    assert_failure(&result, "Error issuing command 'shell' to agent 7: ");

    let result = graphql_query::handle(
        ExecuteQueryParams {
            query: "query { operator { id } }".to_string(),
            variables: None,
        },
        &api,
    )
    .await;
    assert_failure(&result, "Error executing query: ");

    let result = tasks::handle(GetTasksParams::default(), &api).await;
    assert_failure(&result, "Error getting tasks: ");

    let result = payloads::handle_list(SelectionParams::default(), &api).await;
    assert_failure(&result, "Error getting payloads: ");

    let result = payloads::handle_create(payload_params(true), &api).await;
    assert_failure(&result, "Error creating payload: ");

    for result in [
        introspection::handle_schema(&api).await,
        introspection::handle_mutations(&api).await,
        introspection::handle_types(&api).await,
    ] {
        assert_failure(&result, "Error executing introspection query: ");
    }
}

#[tokio::test]
async fn active_callbacks_propagate_remote_errors() {
    let api = FakeMythic::failing("connection refused");

    let err = callbacks::handle(SelectionParams::default(), &api)
        .await
        .unwrap_err();

    match err {
        MythicError::GraphQl(message) => assert_eq!(message, "connection refused"),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// issue_task_and_waitfor_task_output
// ---------------------------------------------------------------------------

#[tokio::test]
async fn task_without_output_reports_no_results() {
    let api = FakeMythic::returning(json!(null)).with_task_output(None);

    let result = issue_task::handle(task_params(TaskParameters::Text("-path /tmp".into()), Some(5)), &api).await;

    assert!(!result.is_error);
    assert_eq!(result.first_text(), "No results returned from task.");
    assert_eq!(result.first_text(), issue_task::NO_RESULTS);
}

#[tokio::test]
async fn task_output_is_returned_unchanged() {
    let output = "uid=0(root) gid=0(root)\n  {\"not\": \"json\"}";
    let api = FakeMythic::returning(json!(null)).with_task_output(Some(output));

    let result = issue_task::handle(task_params(TaskParameters::Text("id".into()), None), &api).await;

    assert!(!result.is_error);
    assert_eq!(result.first_text(), output);
}

#[tokio::test]
async fn task_request_is_forwarded_as_given() {
    let api = FakeMythic::returning(json!(null)).with_task_output(Some("ok"));
    let structured: TaskParameters =
        serde_json::from_value(json!({"command": "whoami", "shell": "/bin/sh"})).unwrap();

    let mut params = task_params(structured.clone(), Some(90));
    params.token_id = Some(12);
    issue_task::handle(params, &api).await;

    assert_eq!(
        api.calls(),
        vec![Call::IssueTask {
            task: TaskRequest {
                command: "shell".to_string(),
                parameters: structured,
                callback_display_id: 7,
                token_id: Some(12),
            },
            timeout: Some(Duration::from_secs(90)),
        }]
    );
}

// ---------------------------------------------------------------------------
// create_payload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_payload_without_wait_returns_envelope() {
    let api = FakeMythic::returning(json!(null));

    let result = payloads::handle_create(payload_params(false), &api).await;

    assert!(!result.is_error);
    let envelope: serde_json::Value = serde_json::from_str(result.first_text()).unwrap();
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["uuid"], "b1c2");

    let calls = api.calls();
    assert_eq!(calls.len(), 1, "no wait call expected: {calls:?}");
    assert!(matches!(calls[0], Call::CreatePayload(_)));
}

#[tokio::test]
async fn create_payload_with_wait_returns_final_build() {
    let built = json!({
        "uuid": "b1c2",
        "build_phase": "success",
        "build_message": "Successfully built!",
        "filemetum": {"agent_file_id": "f00d"}
    });
    let api = FakeMythic::returning(json!(null)).with_built_payload(built.clone());

    let result = payloads::handle_create(payload_params(true), &api).await;

    assert!(!result.is_error);
    let payload: serde_json::Value = serde_json::from_str(result.first_text()).unwrap();
    assert_eq!(payload, built);

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        Call::CreatePayload(definition) => {
            assert_eq!(definition.payload_type, "poseidon");
            assert_eq!(definition.selected_os, "Linux");
            assert_eq!(definition.filename, "agent.bin");
            assert!(definition.commands.is_empty());
            assert!(definition.include_all_commands);
            assert_eq!(definition.c2_profiles[0].c2_profile, "http");
            assert_eq!(definition.build_parameters[0].name, "mode");
        }
        other => panic!("unexpected call: {other:?}"),
    }
    assert_eq!(
        calls[1],
        Call::WaitForPayload {
            uuid: "b1c2".to_string(),
            fields: projection::PAYLOADS.fields.to_string(),
            timeout: Some(Duration::from_secs(120)),
        }
    );
}

#[tokio::test]
async fn create_payload_wait_honours_custom_selection() {
    let api = FakeMythic::returning(json!(null));
    let mut params = payload_params(true);
    params.custom_return_attributes = Some("uuid build_phase".to_string());
    params.commands = Some(vec!["ls".to_string(), "cat".to_string()]);
    params.include_all_commands = false;

    payloads::handle_create(params, &api).await;

    let calls = api.calls();
    match &calls[0] {
        Call::CreatePayload(definition) => {
            assert_eq!(definition.commands, vec!["ls".to_string(), "cat".to_string()]);
            assert!(!definition.include_all_commands);
        }
        other => panic!("unexpected call: {other:?}"),
    }
    match &calls[1] {
        Call::WaitForPayload { fields, .. } => assert_eq!(fields, "uuid build_phase"),
        other => panic!("unexpected call: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Field selections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unset_selections_use_default_projections() {
    let api = FakeMythic::returning(json!([]));

    commands::handle(
        GetCommandsParams {
            payload: "apfell".to_string(),
            custom_return_attributes: None,
        },
        &api,
    )
    .await;
    callbacks::handle(SelectionParams::default(), &api).await.unwrap();
    tasks::handle(GetTasksParams::default(), &api).await;
    payloads::handle_list(SelectionParams::default(), &api).await;

    assert_eq!(
        api.calls(),
        vec![
            Call::Commands {
                payload_type: "apfell".to_string(),
                fields: projection::COMMANDS.fields.to_string(),
            },
            Call::Callbacks {
                fields: projection::CALLBACKS.fields.to_string(),
            },
            Call::Tasks {
                fields: projection::TASKS.fields.to_string(),
                callback_display_id: None,
            },
            Call::Payloads {
                fields: projection::PAYLOADS.fields.to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn custom_selections_replace_defaults() {
    let api = FakeMythic::returning(json!([]));
    let custom = || Some("id host".to_string());

    commands::handle(
        GetCommandsParams {
            payload: "apfell".to_string(),
            custom_return_attributes: Some("cmd attributes".to_string()),
        },
        &api,
    )
    .await;
    callbacks::handle(
        SelectionParams {
            custom_return_attributes: custom(),
        },
        &api,
    )
    .await
    .unwrap();
    tasks::handle(
        GetTasksParams {
            custom_return_attributes: custom(),
            callback_display_id: Some(3),
        },
        &api,
    )
    .await;
    payloads::handle_list(
        SelectionParams {
            custom_return_attributes: custom(),
        },
        &api,
    )
    .await;

    assert_eq!(
        api.calls(),
        vec![
            Call::Commands {
                payload_type: "apfell".to_string(),
                fields: "cmd attributes".to_string(),
            },
            Call::Callbacks {
                fields: "id host".to_string(),
            },
            Call::Tasks {
                fields: "id host".to_string(),
                callback_display_id: Some(3),
            },
            Call::Payloads {
                fields: "id host".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn listing_results_are_serialized_as_json() {
    let callbacks_json = json!([{"id": 1, "display_id": 1, "host": "WS01", "user": "alice"}]);
    let api = FakeMythic::returning(callbacks_json.clone());

    let result = callbacks::handle(SelectionParams::default(), &api).await.unwrap();

    assert!(!result.is_error);
    assert_eq!(result.first_text(), serde_json::to_string(&callbacks_json).unwrap());
}

// ---------------------------------------------------------------------------
// Query passthrough and introspection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn custom_query_is_forwarded_verbatim() {
    let api = FakeMythic::returning(json!({"operator": [{"id": 1}]}));
    let query = "query Ops($name: String!) { operator(where: {username: {_eq: $name}}) { id } }";

    let result = graphql_query::handle(
        ExecuteQueryParams {
            query: query.to_string(),
            variables: serde_json::from_value(json!({"name": "mythic_admin"})).unwrap(),
        },
        &api,
    )
    .await;

    assert_eq!(result.first_text(), r#"{"operator":[{"id":1}]}"#);
    assert_eq!(
        api.calls(),
        vec![Call::Query {
            query: query.to_string(),
            variables: Some(json!({"name": "mythic_admin"})),
        }]
    );
}

#[tokio::test]
async fn introspection_issues_fixed_queries() {
    let api = FakeMythic::returning(json!({"__schema": {"types": [{"name": "callback", "description": null}]}}));

    introspection::handle_schema(&api).await;
    introspection::handle_mutations(&api).await;
    introspection::handle_types(&api).await;
    introspection::handle_types(&api).await;

    let queries: Vec<(String, Option<serde_json::Value>)> = api
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Query { query, variables } => (query, variables),
            other => panic!("unexpected call: {other:?}"),
        })
        .collect();

    assert_eq!(queries[0].0, introspection::SCHEMA_QUERY);
    assert!(queries[0].0.contains("queryType"));
    assert_eq!(queries[1].0, introspection::MUTATIONS_QUERY);
    assert!(queries[1].0.contains("mutationType"));
    assert_eq!(queries[2].0, introspection::TYPES_QUERY);
    assert_eq!(queries[2], queries[3]);
    assert!(queries.iter().all(|(_, variables)| variables.is_none()));
}
