use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;
use users_api::api::UsersHandler;
use users_api::core::config::DatabaseConfig;
use users_api::core::models::{Operation, User};
use users_api::errors::UsersError;
use users_api::notify::Notifier;
use users_api::store::UserStore;

/// Records published messages; optionally fails every publish.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, message: &str) -> Result<(), UsersError> {
        if self.fail {
            return Err(UsersError::UpstreamFailure("queue unavailable".into()));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn sqlite_store(dir: &TempDir) -> UserStore {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("users.db").display());
    UserStore::new(&DatabaseConfig::with_url(url)).unwrap()
}

async fn handler_with(notifier: RecordingNotifier) -> (TempDir, UsersHandler<RecordingNotifier>) {
    let dir = tempfile::tempdir().unwrap();
    let handler = UsersHandler::new(sqlite_store(&dir), notifier);
    let envelope = handler.schema(&json!({})).await;
    assert_eq!(envelope.status_code, "200", "{}", envelope.body);
    (dir, handler)
}

fn post_event(payload: &Value) -> Value {
    json!({ "httpMethod": "POST", "body": payload.to_string() })
}

fn body_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

fn listed_users(body: &str) -> Vec<User> {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_create_echoes_payload_and_notifies() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;
    let payload = json!({ "user_id": "u1", "email": "a@example.com" });

    let envelope = handler.create(&post_event(&payload)).await;

    assert_eq!(envelope.status_code, "200");
    assert_eq!(envelope.headers.content_type, "application/json");
    assert_eq!(body_json(&envelope.body), payload);
    assert_eq!(handler.notifier().messages(), vec!["Created user u1"]);

    let listed = handler.get(&json!({})).await;
    let users = listed_users(&listed.body);
    assert_eq!(
        users
            .iter()
            .filter(|u| u.user_id == "u1" && u.email == "a@example.com")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_create_body_keeps_caller_key_order() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;
    let event = json!({
        "httpMethod": "POST",
        "body": "{\"user_id\":\"u1\",\"email\":\"a@example.com\"}"
    });

    let envelope = handler.create(&event).await;
    assert_eq!(envelope.status_code, "200");
    assert_eq!(
        envelope.body,
        "{\"user_id\": \"u1\", \"email\": \"a@example.com\"}"
    );

    let listed = handler.get(&json!({})).await;
    assert_eq!(
        listed.body,
        "[{\"user_id\": \"u1\", \"email\": \"a@example.com\"}]"
    );

    let schema = handler.schema(&json!({})).await;
    assert_eq!(schema.body, "{\"Msg\": \"Created schema\"}");
}

#[tokio::test]
async fn test_create_with_missing_field_touches_nothing() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;

    for payload in [json!({ "email": "a@example.com" }), json!({ "user_id": "u1" })] {
        let envelope = handler.create(&post_event(&payload)).await;
        assert_eq!(envelope.status_code, "400");
        assert!(envelope.body.contains("Could not create user"));
    }

    assert!(handler.notifier().messages().is_empty());
    let listed = handler.get(&json!({})).await;
    assert!(listed_users(&listed.body).is_empty());
}

#[tokio::test]
async fn test_duplicate_user_id_is_rejected() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;

    let first = handler
        .create(&post_event(&json!({ "user_id": "u1", "email": "a@example.com" })))
        .await;
    let second = handler
        .create(&post_event(&json!({ "user_id": "u1", "email": "other@example.com" })))
        .await;

    assert_eq!(first.status_code, "200");
    assert_eq!(second.status_code, "400");
    assert_eq!(handler.notifier().messages().len(), 1);

    let users = listed_users(&handler.get(&json!({})).await.body);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "a@example.com");
}

#[tokio::test]
async fn test_get_returns_all_rows() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;
    for (id, email) in [("u1", "a@example.com"), ("u2", "b@example.com")] {
        let envelope = handler
            .create(&post_event(&json!({ "user_id": id, "email": email })))
            .await;
        assert_eq!(envelope.status_code, "200");
    }

    let envelope = handler.get(&json!({})).await;
    assert_eq!(envelope.status_code, "200");

    let users: HashSet<User> = listed_users(&envelope.body).into_iter().collect();
    let expected: HashSet<User> = [("u1", "a@example.com"), ("u2", "b@example.com")]
        .into_iter()
        .map(|(id, email)| User {
            user_id: id.into(),
            email: email.into(),
        })
        .collect();
    assert_eq!(users, expected);
}

#[tokio::test]
async fn test_schema_empties_table_and_is_idempotent() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;
    handler
        .create(&post_event(&json!({ "user_id": "u1", "email": "a@example.com" })))
        .await;

    for _ in 0..2 {
        let envelope = handler.schema(&json!({})).await;
        assert_eq!(envelope.status_code, "200");
        assert_eq!(body_json(&envelope.body), json!({ "Msg": "Created schema" }));
    }

    let envelope = handler.get(&json!({})).await;
    assert_eq!(envelope.status_code, "200");
    assert_eq!(body_json(&envelope.body), json!([]));
}

#[tokio::test]
async fn test_failed_publish_reports_error_but_keeps_row() {
    let (_dir, handler) = handler_with(RecordingNotifier::failing()).await;

    let envelope = handler
        .create(&post_event(&json!({ "user_id": "u1", "email": "a@example.com" })))
        .await;
    assert_eq!(envelope.status_code, "400");
    assert!(envelope.body.contains("queue unavailable"));

    let users = listed_users(&handler.get(&json!({})).await.body);
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_wrapped_and_query_string_events() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;

    let wrapped = json!({
        "data": {
            "httpMethod": "POST",
            "body": "{\"user_id\":\"w1\",\"email\":\"w@example.com\"}"
        }
    });
    assert_eq!(handler.create(&wrapped).await.status_code, "200");

    let query = json!({
        "httpMethod": "GET",
        "queryStringParameters": { "user_id": "q1", "email": "q@example.com" }
    });
    let envelope = handler.create(&query).await;
    assert_eq!(envelope.status_code, "200");
    assert_eq!(body_json(&envelope.body)["user_id"], "q1");

    assert_eq!(
        handler.notifier().messages(),
        vec!["Created user w1", "Created user q1"]
    );
}

#[tokio::test]
async fn test_dispatch_routes_operations() {
    let (_dir, handler) = handler_with(RecordingNotifier::default()).await;
    let event = post_event(&json!({ "user_id": "u1", "email": "a@example.com" }));

    assert_eq!(handler.dispatch(Operation::Create, &event).await.status_code, "200");
    let listed = handler.dispatch(Operation::Get, &json!({})).await;
    assert_eq!(listed_users(&listed.body).len(), 1);
    let schema = handler.dispatch(Operation::Schema, &json!({})).await;
    assert_eq!(body_json(&schema.body)["Msg"], "Created schema");
}

#[tokio::test]
async fn test_unreachable_store_yields_error_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}",
        dir.path().join("missing").join("users.db").display()
    );
    let handler = UsersHandler::new(
        UserStore::new(&DatabaseConfig::with_url(url)).unwrap(),
        RecordingNotifier::default(),
    );

    let envelope = handler.get(&json!({})).await;
    assert_eq!(envelope.status_code, "400");
    assert!(
        envelope
            .body
            .starts_with("ERROR: Unexpected error: Could not get users:")
    );

    let envelope = handler.schema(&json!({})).await;
    assert_eq!(envelope.status_code, "400");

    let envelope = handler
        .create(&post_event(&json!({ "user_id": "u1", "email": "a@example.com" })))
        .await;
    assert_eq!(envelope.status_code, "400");
    assert!(handler.notifier().messages().is_empty());
}
