use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use super::*;
use crate::common::{MessageId, Sender};

#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<Option<String>>>>,
    headers: Arc<Mutex<Vec<HeaderMap>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn list_rows(
    State(recorded): State<Recorded>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Value> {
    recorded.queries.lock().unwrap().push(query);
    recorded.headers.lock().unwrap().push(headers);
    Json(json!([
        {"id": 1, "text": "hi", "sender": "ai", "timestamp": "2025-01-01T10:00:00Z"},
        {"id": 2, "text": "broken", "sender": "robot", "timestamp": "2025-01-01T10:01:00Z"},
        {"id": "3", "text": "hello", "sender": "user", "timestamp": "2025-01-01T10:02:00Z"},
        {"id": 4, "text": "undated", "sender": "system", "timestamp": null},
        {"id": 5, "text": "no column", "sender": "ai"}
    ]))
}

async fn insert_row(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    recorded.headers.lock().unwrap().push(headers);
    recorded.bodies.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn handle_for(base_url: String) -> BackendHandle {
    let config = BackendConfig::new(Some(base_url), Some("anon-key".into())).unwrap();
    BackendHandle::new(config).unwrap()
}

fn mock_backend(recorded: Recorded) -> Router {
    Router::new()
        .route("/rest/v1/messages", get(list_rows).post(insert_row))
        .with_state(recorded)
}

#[tokio::test]
async fn fetch_orders_by_timestamp_and_skips_only_undecodable_rows() {
    let recorded = Recorded::default();
    let handle = handle_for(serve(mock_backend(recorded.clone())).await);

    let messages = handle.fetch_messages("messages").await.unwrap();

    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "3", "4", "5"]);
    assert_eq!(messages[0].sender, Sender::Ai);
    assert_eq!(messages[1].id, MessageId::new("3"));
    assert_eq!(messages[2].timestamp, "");
    assert_eq!(messages[3].timestamp, "");

    let query = recorded.queries.lock().unwrap()[0].clone().unwrap();
    assert!(query.contains("select=*") || query.contains("select=%2A"));
    assert!(query.contains("order=timestamp.asc"));
}

#[tokio::test]
async fn requests_carry_api_key_headers() {
    let recorded = Recorded::default();
    let handle = handle_for(serve(mock_backend(recorded.clone())).await);

    handle.fetch_messages("messages").await.unwrap();

    let headers = recorded.headers.lock().unwrap();
    assert_eq!(headers[0].get("apikey").unwrap(), "anon-key");
    assert_eq!(headers[0].get("authorization").unwrap(), "Bearer anon-key");
}

#[tokio::test]
async fn insert_posts_single_row_array() {
    let recorded = Recorded::default();
    let handle = handle_for(serve(mock_backend(recorded.clone())).await);

    let message = NewMessage {
        text: "hello".into(),
        sender: Sender::User,
        timestamp: "2025-01-01T10:00:00.000Z".into(),
    };
    handle.insert_message("messages", &message).await.unwrap();

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!([{"text": "hello", "sender": "user", "timestamp": "2025-01-01T10:00:00.000Z"}])
    );
    let headers = recorded.headers.lock().unwrap();
    assert_eq!(headers[0].get("prefer").unwrap(), "return=minimal");
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let app = Router::new().route(
        "/rest/v1/messages",
        get(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
    );
    let handle = handle_for(serve(app).await);

    let err = handle.fetch_messages("messages").await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = handle_for(format!("http://{addr}"));
    let message = NewMessage::from_user("hi").unwrap();
    let err = handle.insert_message("messages", &message).await.unwrap_err();
    assert!(matches!(err, BackendError::Http(_)));
}
