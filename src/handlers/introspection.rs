use tracing::warn;

use crate::mythic::MythicApi;
use crate::protocol::ToolResult;

pub const SCHEMA_QUERY: &str = "query Introspection {__schema {queryType {fields {name description}}}}";

pub const MUTATIONS_QUERY: &str = "query Mutations {
  __schema {
    mutationType {
      fields {
        name
        description
      }
    }
  }
}";

pub const TYPES_QUERY: &str = "query Types {
  __schema {
    types {
      name
      description
    }
  }
}";

/// `graphql_introspection_schema`: query field names and descriptions.
pub async fn handle_schema(api: &dyn MythicApi) -> ToolResult {
    run(api, SCHEMA_QUERY).await
}

/// `graphql_introspection_mutations`: mutation field names and descriptions.
pub async fn handle_mutations(api: &dyn MythicApi) -> ToolResult {
    run(api, MUTATIONS_QUERY).await
}

/// `graphql_introspection_types`: type names and descriptions.
pub async fn handle_types(api: &dyn MythicApi) -> ToolResult {
    run(api, TYPES_QUERY).await
}

async fn run(api: &dyn MythicApi, query: &str) -> ToolResult {
    match api.execute_custom_query(query, None).await {
        Ok(data) => ToolResult::json(&data),
        Err(e) => {
            warn!(error = %e, "introspection query failed");
            ToolResult::error(format!("Error executing introspection query: {e}"))
        }
    }
}
