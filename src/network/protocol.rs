//! Phoenix channel frames as spoken by the realtime endpoint.
//!
//! Every websocket text message is one JSON object
//! `{topic, event, payload, ref, join_ref}`. Only the handful of events the
//! chat needs are interpreted; everything else decodes to
//! [`ChannelEvent::Other`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::common::Message;
use crate::config::ChannelSettings;

pub const PHOENIX_TOPIC: &str = "phoenix";

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";
pub const EVENT_SYSTEM: &str = "system";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl Frame {
    /// Subscribe to inserts on the configured table.
    pub fn join(settings: &ChannelSettings, access_token: &str, reference: &str) -> Self {
        Self {
            topic: settings.topic(),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "ack": false, "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [{
                        "event": "INSERT",
                        "schema": settings.schema,
                        "table": settings.table,
                    }],
                    "private": false,
                },
                "access_token": access_token,
            }),
            reference: Some(reference.to_string()),
            join_ref: Some(reference.to_string()),
        }
    }

    pub fn leave(settings: &ChannelSettings, reference: &str, join_ref: &str) -> Self {
        Self {
            topic: settings.topic(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: Some(join_ref.to_string()),
        }
    }

    pub fn heartbeat(reference: &str) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: None,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// What a decoded frame means for the chat.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Reply to our `phx_join`.
    Joined {
        reference: Option<String>,
    },
    JoinRejected {
        reason: String,
    },
    HeartbeatAck,
    /// A new row on the watched table.
    Insert(Message),
    /// Server-side status notice, e.g. the postgres extension attaching.
    System {
        ok: bool,
        message: String,
    },
    /// The server closed or errored our channel.
    Closed {
        reason: String,
    },
    Other(String),
}

#[derive(Deserialize)]
struct ReplyPayload {
    status: String,
    #[serde(default)]
    response: Value,
}

#[derive(Deserialize)]
struct ChangesPayload {
    data: ChangeData,
}

#[derive(Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    schema: Option<String>,
    table: String,
    #[serde(default)]
    record: Value,
}

#[derive(Deserialize)]
struct SystemPayload {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Interpret one text frame received on the socket.
pub fn decode(text: &str, settings: &ChannelSettings) -> Result<ChannelEvent, serde_json::Error> {
    let frame: Frame = serde_json::from_str(text)?;

    if frame.topic == PHOENIX_TOPIC {
        return Ok(match frame.event.as_str() {
            EVENT_REPLY => ChannelEvent::HeartbeatAck,
            other => ChannelEvent::Other(other.to_string()),
        });
    }

    if frame.topic != settings.topic() {
        return Ok(ChannelEvent::Other(format!("{}:{}", frame.topic, frame.event)));
    }

    match frame.event.as_str() {
        EVENT_REPLY => {
            let reply: ReplyPayload = serde_json::from_value(frame.payload)?;
            if reply.status == "ok" {
                Ok(ChannelEvent::Joined {
                    reference: frame.reference,
                })
            } else {
                Ok(ChannelEvent::JoinRejected {
                    reason: reply_reason(&reply.response),
                })
            }
        }
        EVENT_POSTGRES_CHANGES => {
            let changes: ChangesPayload = serde_json::from_value(frame.payload)?;
            let data = changes.data;
            let schema_matches = data
                .schema
                .as_deref()
                .is_none_or(|schema| schema == settings.schema);
            if data.kind != "INSERT" || data.table != settings.table || !schema_matches {
                return Ok(ChannelEvent::Other(format!("{} on {}", data.kind, data.table)));
            }
            let message: Message = serde_json::from_value(data.record)?;
            Ok(ChannelEvent::Insert(message))
        }
        EVENT_SYSTEM => {
            let system: SystemPayload = serde_json::from_value(frame.payload)?;
            Ok(ChannelEvent::System {
                ok: system.status == "ok",
                message: system.message,
            })
        }
        EVENT_ERROR => Ok(ChannelEvent::Closed {
            reason: "channel error".to_string(),
        }),
        EVENT_CLOSE => Ok(ChannelEvent::Closed {
            reason: "channel closed by server".to_string(),
        }),
        other => Ok(ChannelEvent::Other(other.to_string())),
    }
}

fn reply_reason(response: &Value) -> String {
    response
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
