//! Client side of the Mythic C2 server: login, GraphQL, subscriptions.

pub mod api;
pub mod error;
pub mod graphql;
pub mod projection;
pub mod session;
pub mod subscription;

pub use api::{
    BuildParameter, C2ProfileSelection, MythicApi, PayloadCreated, PayloadDefinition,
    TaskParameters, TaskRequest,
};
pub use error::{MythicError, MythicResult};
pub use projection::Projection;
pub use session::Session;
