//! One-shot GraphQL subscriptions over Apollo's `graphql-ws` protocol.
//!
//! Mythic (via Hasura) pushes the current value of a live query every time it
//! changes. A wait opens one connection, watches the pushed values until a
//! predicate says the watched object reached a terminal state, then closes.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use super::error::{MythicError, MythicResult};
use super::graphql::GraphQlResponse;

const SUBPROTOCOL: &str = "graphql-ws";
const OPERATION_ID: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Server-to-client message of the `graphql-ws` protocol.
#[derive(Debug, Deserialize)]
struct ServerFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Clone)]
pub struct Subscriber {
    url: Url,
    access_token: String,
    verify_tls: bool,
}

impl Subscriber {
    pub fn new(url: Url, access_token: String, verify_tls: bool) -> Self {
        Self {
            url,
            access_token,
            verify_tls,
        }
    }

    /// Subscribe to `query` and return the first pushed `data` for which
    /// `is_terminal` holds.
    pub async fn wait_for<F>(
        &self,
        query: &str,
        variables: Value,
        mut is_terminal: F,
    ) -> MythicResult<Value>
    where
        F: FnMut(&Value) -> bool + Send,
    {
        let mut ws = self.connect().await?;

        send(
            &mut ws,
            json!({
                "type": "connection_init",
                "payload": {
                    "headers": { "Authorization": format!("Bearer {}", self.access_token) }
                }
            }),
        )
        .await?;
        send(
            &mut ws,
            json!({
                "id": OPERATION_ID,
                "type": "start",
                "payload": { "query": query, "variables": variables }
            }),
        )
        .await?;

        while let Some(message) = ws.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "no reason given".to_string());
                    return Err(MythicError::Subscription(format!(
                        "connection closed by server: {reason}"
                    )));
                }
                _ => continue,
            };

            let frame: ServerFrame = serde_json::from_str(&text)?;
            match frame.kind.as_str() {
                "connection_ack" | "ka" => continue,
                "data" => {
                    let data = serde_json::from_value::<GraphQlResponse>(frame.payload)?.into_data()?;
                    if is_terminal(&data) {
                        finish(&mut ws).await;
                        return Ok(data);
                    }
                    debug!(update = %data, "subscription update");
                }
                "connection_error" | "error" => {
                    finish(&mut ws).await;
                    return Err(MythicError::Subscription(describe_payload(&frame.payload)));
                }
                "complete" => {
                    return Err(MythicError::Subscription(
                        "subscription completed before reaching a terminal state".to_string(),
                    ));
                }
                other => debug!(kind = other, "ignoring subscription frame"),
            }
        }

        Err(MythicError::Subscription("connection closed".to_string()))
    }

    async fn connect(&self) -> MythicResult<Socket> {
        let mut request = self.url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));

        let connector = if self.url.scheme() == "wss" {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(!self.verify_tls)
                .danger_accept_invalid_hostnames(!self.verify_tls)
                .build()?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        debug!(url = %self.url, "opening subscription");
        let (ws, _) = connect_async_tls_with_config(request, None, false, connector).await?;
        Ok(ws)
    }
}

async fn send(ws: &mut Socket, frame: Value) -> MythicResult<()> {
    ws.send(Message::Text(frame.to_string())).await?;
    Ok(())
}

/// Best effort: tell the server we're done and close.
async fn finish(ws: &mut Socket) {
    let _ = send(ws, json!({ "id": OPERATION_ID, "type": "stop" })).await;
    let _ = ws.close(None).await;
}

fn describe_payload(payload: &Value) -> String {
    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(errors) = payload.as_array() {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
