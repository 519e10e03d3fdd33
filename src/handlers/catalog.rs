//! Names, descriptions and input schemas advertised by `tools/list`.

use serde_json::{json, Value};

pub const GET_COMMANDS: &str = "get_all_commands_for_payloadtype";
pub const ISSUE_TASK: &str = "issue_task_and_waitfor_task_output";
pub const EXECUTE_QUERY: &str = "execute_graphql_query";
pub const ACTIVE_CALLBACKS: &str = "get_all_active_callbacks";
pub const GET_TASKS: &str = "get_all_tasks";
pub const GET_PAYLOADS: &str = "get_all_payloads";
pub const CREATE_PAYLOAD: &str = "create_payload";
pub const INTROSPECT_SCHEMA: &str = "graphql_introspection_schema";
pub const INTROSPECT_MUTATIONS: &str = "graphql_introspection_mutations";
pub const INTROSPECT_TYPES: &str = "graphql_introspection_types";

pub const TOOL_NAMES: [&str; 10] = [
    GET_COMMANDS,
    ISSUE_TASK,
    EXECUTE_QUERY,
    ACTIVE_CALLBACKS,
    GET_TASKS,
    GET_PAYLOADS,
    CREATE_PAYLOAD,
    INTROSPECT_SCHEMA,
    INTROSPECT_MUTATIONS,
    INTROSPECT_TYPES,
];

fn custom_return_attributes() -> Value {
    selection_attributes("`id`")
}

fn selection_attributes(required: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("Optional GraphQL selection of attributes to return. The default set is used when omitted; a custom selection replaces it entirely and must include {required}.")
    })
}

fn description(name: &str) -> &'static str {
    match name {
        GET_COMMANDS => "Get every current command, with its parameters, for a payload type.",
        ISSUE_TASK => "Issue a task to run `command` on an agent, wait for the agent to check in and execute it, and return its output (binary output is coerced to text).",
        EXECUTE_QUERY => "Execute an arbitrary Mythic GraphQL query or mutation and return the JSON response.",
        ACTIVE_CALLBACKS => "Get information about all currently active callbacks.",
        GET_TASKS => "Get all tasks submitted so far, optionally limited to a single callback.",
        GET_PAYLOADS => "Get all payloads registered with Mythic, including deleted and auto-generated ones.",
        CREATE_PAYLOAD => "Build a new payload. With `return_on_complete` (default) this waits for the build and returns the payload; otherwise it returns the status, error and uuid immediately.",
        INTROSPECT_SCHEMA => "Get the names and descriptions of every query field in the Mythic GraphQL schema.",
        INTROSPECT_MUTATIONS => "Get the names and descriptions of every Mythic GraphQL mutation.",
        INTROSPECT_TYPES => "Get the names and descriptions of every Mythic GraphQL type.",
        _ => "",
    }
}

/// JSON Schema for a tool's `arguments`, or `None` for an unknown tool.
pub fn input_schema(name: &str) -> Option<Value> {
    let schema = match name {
        GET_COMMANDS => json!({
            "type": "object",
            "required": ["payload"],
            "properties": {
                "payload": {
                    "type": "string",
                    "description": "Name of the payload type (agent) to list commands for"
                },
                "custom_return_attributes": selection_attributes("`cmd` and `attributes`")
            }
        }),
        ISSUE_TASK => json!({
            "type": "object",
            "required": ["command", "parameters", "callback_display_id"],
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command name, the `cmd` field from get_all_commands_for_payloadtype. Check the agent's OS against the command's supported OS."
                },
                "parameters": {
                    "type": ["string", "object"],
                    "description": "Preferably a JSON object keyed by each parameter's `name` (e.g. {\"arguments\": \"value\"}); alternatively flag-style text using `cli_name` (e.g. -path /etc/issue)."
                },
                "callback_display_id": {
                    "type": "integer",
                    "description": "display_id of the callback to run the command on"
                },
                "token_id": {
                    "type": "integer",
                    "description": "Optional Mythic id of a tracked Windows access token to impersonate"
                },
                "timeout": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Optional seconds to wait for the task to complete"
                }
            }
        }),
        EXECUTE_QUERY => json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "GraphQL query or mutation text"
                },
                "variables": {
                    "type": "object",
                    "description": "Variables keyed by name (without the `$` prefix), each matching the type declared in the query"
                }
            }
        }),
        ACTIVE_CALLBACKS | GET_PAYLOADS => json!({
            "type": "object",
            "properties": {
                "custom_return_attributes": custom_return_attributes()
            }
        }),
        GET_TASKS => json!({
            "type": "object",
            "properties": {
                "custom_return_attributes": custom_return_attributes(),
                "callback_display_id": {
                    "type": "integer",
                    "description": "Only return tasks submitted to this callback"
                }
            }
        }),
        CREATE_PAYLOAD => json!({
            "type": "object",
            "required": [
                "payload_type_name",
                "filename",
                "operating_system",
                "c2_profiles",
                "build_parameters",
                "description"
            ],
            "properties": {
                "payload_type_name": { "type": "string", "description": "Payload type to build" },
                "filename": { "type": "string", "description": "Filename of the built payload" },
                "operating_system": { "type": "string", "description": "Target operating system" },
                "c2_profiles": {
                    "type": "array",
                    "description": "C2 profiles to include, with their parameters (see the profile's build info in Mythic)",
                    "items": {
                        "type": "object",
                        "required": ["c2_profile"],
                        "properties": {
                            "c2_profile": { "type": "string" },
                            "c2_profile_parameters": { "type": "object" }
                        }
                    }
                },
                "commands": {
                    "type": ["array", "null"],
                    "items": { "type": "string" },
                    "description": "Command names to include. When empty Mythic includes the builtin and recommended commands for the OS."
                },
                "build_parameters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["name", "value"],
                        "properties": {
                            "name": { "type": "string" },
                            "value": {}
                        }
                    }
                },
                "description": { "type": "string" },
                "return_on_complete": {
                    "type": "boolean",
                    "default": true,
                    "description": "Wait for the build to finish before returning"
                },
                "timeout": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Optional seconds to wait for the build"
                },
                "custom_return_attributes": custom_return_attributes(),
                "include_all_commands": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include every command of the payload type"
                }
            }
        }),
        INTROSPECT_SCHEMA | INTROSPECT_MUTATIONS | INTROSPECT_TYPES => json!({
            "type": "object",
            "properties": {}
        }),
        _ => return None,
    };
    Some(schema)
}

/// The `tools` array for `tools/list`.
pub fn tool_definitions() -> Vec<Value> {
    TOOL_NAMES
        .iter()
        .filter_map(|name| {
            input_schema(name).map(|schema| {
                json!({
                    "name": name,
                    "description": description(name),
                    "inputSchema": schema
                })
            })
        })
        .collect()
}
