//! Errors raised while talking to the Mythic server.

use thiserror::Error;

pub type MythicResult<T> = Result<T, MythicError>;

#[derive(Debug, Error)]
pub enum MythicError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Mythic answered, but with `status: error` in the mutation envelope.
    #[error("{0}")]
    Remote(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Missing field in response: {0}")]
    MissingData(&'static str),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 in response: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl From<tokio_tungstenite::tungstenite::Error> for MythicError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
