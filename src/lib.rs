//! MCP server for a Mythic C2 server.
//!
//! Logs in once with the operator's credentials, then exposes Mythic's
//! GraphQL API (commands, callbacks, tasks, payloads, schema introspection)
//! as MCP tools over JSON-RPC 2.0 stdio transport.

pub mod config;
pub mod handlers;
pub mod mythic;
pub mod protocol;
pub mod server;

pub mod schema;
