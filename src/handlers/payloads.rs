use std::time::Duration;

use tracing::{info, warn};

use crate::handlers::catalog::{CREATE_PAYLOAD, GET_PAYLOADS};
use crate::mythic::{projection, MythicApi, MythicError, PayloadDefinition};
use crate::protocol::{CreatePayloadParams, SelectionParams, ToolResult};

/// Handle a `get_all_payloads` tool call.
pub async fn handle_list(params: SelectionParams, api: &dyn MythicApi) -> ToolResult {
    let fields = projection::PAYLOADS.select(params.custom_return_attributes.as_deref());

    match api.get_all_payloads(fields).await {
        Ok(payloads) => ToolResult::json(&payloads),
        Err(e) => {
            warn!(tool = GET_PAYLOADS, error = %e, "remote call failed");
            ToolResult::error(format!("Error getting payloads: {e}"))
        }
    }
}

/// Handle a `create_payload` tool call.
///
/// Without `return_on_complete` the `{status, error, uuid}` envelope from the
/// build request is returned as soon as Mythic accepts it. With it, the
/// handler waits for the build to leave the `building` phase and returns the
/// payload's attributes (`custom_return_attributes` only matters here).
pub async fn handle_create(params: CreatePayloadParams, api: &dyn MythicApi) -> ToolResult {
    let definition = PayloadDefinition {
        payload_type: params.payload_type_name,
        filename: params.filename,
        selected_os: params.operating_system,
        description: params.description,
        c2_profiles: params.c2_profiles,
        commands: params.commands.unwrap_or_default(),
        build_parameters: params.build_parameters,
        include_all_commands: params.include_all_commands,
    };

    let created = match api.create_payload(&definition).await {
        Ok(created) => created,
        Err(e) => return failure(e),
    };

    if !params.return_on_complete {
        return ToolResult::json(&created);
    }

    let Some(uuid) = created.uuid.as_deref() else {
        return failure(MythicError::MissingData("createPayload.uuid"));
    };
    info!(uuid, "waiting for payload build");

    let fields = projection::PAYLOADS.select(params.custom_return_attributes.as_deref());
    let timeout = params.timeout.map(Duration::from_secs);
    match api.wait_for_payload_build(uuid, fields, timeout).await {
        Ok(payload) => ToolResult::json(&payload),
        Err(e) => failure(e),
    }
}

fn failure(e: MythicError) -> ToolResult {
    warn!(tool = CREATE_PAYLOAD, error = %e, "remote call failed");
    ToolResult::error(format!("Error creating payload: {e}"))
}
