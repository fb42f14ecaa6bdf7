use serde_json::{Value, json};

use super::*;
use crate::common::{MessageId, Sender};

fn settings() -> ChannelSettings {
    ChannelSettings::default()
}

fn insert_frame(table: &str, kind: &str, record: Value) -> String {
    json!({
        "topic": "realtime:chat-room-1",
        "event": "postgres_changes",
        "payload": {
            "ids": [12345],
            "data": {
                "type": kind,
                "schema": "public",
                "table": table,
                "commit_timestamp": "2025-01-01T10:00:00Z",
                "record": record,
                "errors": null
            }
        },
        "ref": null
    })
    .to_string()
}

// =============================================================================
// Outgoing frames
// =============================================================================

#[test]
fn join_frame_subscribes_to_table_inserts() {
    let frame = Frame::join(&settings(), "anon-key", "1");
    let value: Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

    assert_eq!(value["topic"], "realtime:chat-room-1");
    assert_eq!(value["event"], "phx_join");
    assert_eq!(value["ref"], "1");
    assert_eq!(value["join_ref"], "1");
    assert_eq!(value["payload"]["access_token"], "anon-key");
    assert_eq!(
        value["payload"]["config"]["postgres_changes"],
        json!([{"event": "INSERT", "schema": "public", "table": "messages"}])
    );
}

#[test]
fn heartbeat_targets_phoenix_topic_without_join_ref() {
    let value: Value =
        serde_json::from_str(&Frame::heartbeat("7").encode().unwrap()).unwrap();
    assert_eq!(value["topic"], "phoenix");
    assert_eq!(value["event"], "heartbeat");
    assert_eq!(value["ref"], "7");
    assert!(value.get("join_ref").is_none());
}

#[test]
fn leave_frame_reuses_join_ref() {
    let frame = Frame::leave(&settings(), "9", "1");
    assert_eq!(frame.event, "phx_leave");
    assert_eq!(frame.topic, "realtime:chat-room-1");
    assert_eq!(frame.join_ref.as_deref(), Some("1"));
}

// =============================================================================
// Incoming frames
// =============================================================================

#[test]
fn insert_event_decodes_record() {
    let text = insert_frame(
        "messages",
        "INSERT",
        json!({"id": 2, "text": "hello", "sender": "user", "timestamp": "2025-01-01T10:00:00Z"}),
    );

    match decode(&text, &settings()).unwrap() {
        ChannelEvent::Insert(message) => {
            assert_eq!(message.id, MessageId::new("2"));
            assert_eq!(message.text, "hello");
            assert_eq!(message.sender, Sender::User);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn insert_without_timestamp_still_decodes() {
    let text = insert_frame(
        "messages",
        "INSERT",
        json!({"id": 3, "text": "undated", "sender": "ai", "timestamp": null}),
    );

    match decode(&text, &settings()).unwrap() {
        ChannelEvent::Insert(message) => {
            assert_eq!(message.id, MessageId::new("3"));
            assert_eq!(message.timestamp, "");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn changes_on_other_tables_or_kinds_are_ignored() {
    let record = json!({"id": 2, "text": "x", "sender": "user", "timestamp": "t"});

    let other_table = insert_frame("profiles", "INSERT", record.clone());
    assert!(matches!(
        decode(&other_table, &settings()).unwrap(),
        ChannelEvent::Other(_)
    ));

    let update = insert_frame("messages", "UPDATE", record);
    assert!(matches!(
        decode(&update, &settings()).unwrap(),
        ChannelEvent::Other(_)
    ));
}

#[test]
fn malformed_insert_record_is_an_error() {
    let text = insert_frame("messages", "INSERT", json!({"id": 2, "text": "x"}));
    assert!(decode(&text, &settings()).is_err());
}

#[test]
fn join_reply_ok_and_error() {
    let ok = json!({
        "topic": "realtime:chat-room-1",
        "event": "phx_reply",
        "payload": {"status": "ok", "response": {"postgres_changes": []}},
        "ref": "1"
    })
    .to_string();
    assert_eq!(
        decode(&ok, &settings()).unwrap(),
        ChannelEvent::Joined {
            reference: Some("1".into())
        }
    );

    let rejected = json!({
        "topic": "realtime:chat-room-1",
        "event": "phx_reply",
        "payload": {"status": "error", "response": {"reason": "Invalid JWT"}},
        "ref": "1"
    })
    .to_string();
    assert_eq!(
        decode(&rejected, &settings()).unwrap(),
        ChannelEvent::JoinRejected {
            reason: "Invalid JWT".into()
        }
    );
}

#[test]
fn heartbeat_reply_is_acknowledged() {
    let text = json!({
        "topic": "phoenix",
        "event": "phx_reply",
        "payload": {"status": "ok", "response": {}},
        "ref": "3"
    })
    .to_string();
    assert_eq!(decode(&text, &settings()).unwrap(), ChannelEvent::HeartbeatAck);
}

#[test]
fn system_and_close_events() {
    let system = json!({
        "topic": "realtime:chat-room-1",
        "event": "system",
        "payload": {"status": "ok", "message": "Subscribed to PostgreSQL", "extension": "postgres_changes"},
        "ref": null
    })
    .to_string();
    assert_eq!(
        decode(&system, &settings()).unwrap(),
        ChannelEvent::System {
            ok: true,
            message: "Subscribed to PostgreSQL".into()
        }
    );

    let close = json!({
        "topic": "realtime:chat-room-1",
        "event": "phx_close",
        "payload": {},
        "ref": "1"
    })
    .to_string();
    assert!(matches!(
        decode(&close, &settings()).unwrap(),
        ChannelEvent::Closed { .. }
    ));
}

#[test]
fn frames_for_other_topics_are_ignored() {
    let text = json!({
        "topic": "realtime:another-room",
        "event": "phx_close",
        "payload": {},
        "ref": null
    })
    .to_string();
    assert!(matches!(
        decode(&text, &settings()).unwrap(),
        ChannelEvent::Other(_)
    ));
}

#[test]
fn garbage_is_a_decode_error() {
    assert!(decode("not json", &settings()).is_err());
}
