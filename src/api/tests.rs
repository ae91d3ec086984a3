// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{router, AppState};
use crate::store::Database;

async fn test_app() -> Router {
    let db = Database::in_memory().await.expect("in-memory database");
    db.migrate().await.expect("migrate");
    router(AppState { db })
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Drives one request through the router; returns status, the `name=value`
/// part of any `Set-Cookie`, and the parsed JSON body (Null when empty).
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_owned);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, cookie, body)
}

async fn signup(app: &Router, username: &str, email: &str) -> String {
    let body = json!({ "username": username, "email": email, "password": "hunter2" });
    let (status, cookie, _) = send(app, request(Method::POST, "/signup", None, Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    cookie.expect("session cookie")
}

async fn create_flow(app: &Router, cookie: &str) -> String {
    let (status, _, body) = send(app, request(Method::POST, "/flows", Some(cookie), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["flowId"].as_str().expect("flowId").to_owned()
}

async fn create_note(app: &Router, cookie: &str, flow_id: &str) -> String {
    let body = json!({ "flowId": flow_id });
    let (status, _, body) = send(app, request(Method::POST, "/notes", Some(cookie), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("note id").to_owned()
}

// ---- auth ---------------------------------------------------------------

#[tokio::test]
async fn signup_creates_one_user_and_conflicts_on_repeat() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let (status, _, body) = send(&app, request(Method::GET, "/user", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");

    let repeat = json!({ "username": "ada2", "email": "ada@example.com", "password": "other" });
    let (status, _, body) = send(&app, request(Method::POST, "/signup", None, Some(repeat))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already taken.");

    // The original account is untouched.
    let login = json!({ "email": "ada@example.com", "password": "hunter2" });
    let (status, _, body) = send(&app, request(Method::POST, "/login", None, Some(login))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
}

#[rstest]
#[case::username(json!({"email": "a@example.com", "password": "pw"}), "Username is missing.")]
#[case::email(json!({"username": "a", "password": "pw"}), "Email is missing.")]
#[case::password(json!({"username": "a", "email": "a@example.com"}), "Password is missing.")]
#[case::empty_username(json!({"username": "", "email": "a@example.com", "password": "pw"}), "Username is missing.")]
#[tokio::test]
async fn signup_rejects_missing_fields(#[case] body: Value, #[case] message: &str) {
    let app = test_app().await;
    let (status, _, response) = send(&app, request(Method::POST, "/signup", None, Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], message);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app().await;
    signup(&app, "ada", "ada@example.com").await;

    let wrong_password = json!({ "email": "ada@example.com", "password": "nope" });
    let (status, _, wrong_pw_body) =
        send(&app, request(Method::POST, "/login", None, Some(wrong_password))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown_email = json!({ "email": "ghost@example.com", "password": "nope" });
    let (status, _, unknown_body) =
        send(&app, request(Method::POST, "/login", None, Some(unknown_email))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_pw_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn requests_without_a_valid_session_are_rejected() {
    let app = test_app().await;

    let (status, _, body) = send(&app, request(Method::GET, "/flows", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not authenticated");

    let forged = format!("mindflow_sid={}", uuid::Uuid::new_v4());
    let (status, _, _) = send(&app, request(Method::GET, "/flows", Some(&forged), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let (status, cleared, _) =
        send(&app, request(Method::POST, "/logout", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(cleared.as_deref(), Some("mindflow_sid="));

    let (status, _, _) = send(&app, request(Method::GET, "/user", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_responses_reissue_the_rolling_cookie() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let (status, reissued, _) = send(&app, request(Method::GET, "/user", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reissued.as_deref(), Some(cookie.as_str()));
}

// ---- flows --------------------------------------------------------------

#[tokio::test]
async fn created_flow_has_one_root_node_and_appears_in_the_listing() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let flow_id = create_flow(&app, &cookie).await;

    let (status, _, listing) = send(&app, request(Method::GET, "/flows", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing, json!([{ "flowId": flow_id, "topic": "New Topic" }]));

    let (status, _, doc) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let nodes = doc["flow"]["nodes"].as_array().expect("nodes");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["id"], "0");
    assert_eq!(nodes[0]["data"]["label"], "New Topic");
}

#[tokio::test]
async fn flow_update_is_a_full_replace_round_trip() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &cookie).await;

    let payload = json!({
        "nodes": [
            {"id": "0", "type": "topicNode", "position": {"x": 1.5, "y": 2.5},
             "data": {"label": "Root", "noteId": ""}, "width": 100, "height": 27},
            {"id": "n1", "type": "topicNode", "position": {"x": 10.0, "y": 20.0},
             "data": {"label": "Child", "noteId": ""}}
        ],
        "edges": [{"id": "e1", "source": "0", "target": "n1"}],
        "viewport": {"x": 5.0, "y": 6.0, "zoom": 1.5}
    });

    let (status, _, updated) = send(
        &app,
        request(
            Method::PUT,
            &format!("/flows/{flow_id}"),
            Some(&cookie),
            Some(json!({ "flowchart": payload })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["flow"], payload);

    let (status, _, fetched) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["flow"], payload);
}

#[tokio::test]
async fn rename_updates_summary_and_root_label_together() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &cookie).await;

    let body = json!({ "flowId": flow_id, "topic": "Databases" });
    let (status, _, _) = send(
        &app,
        request(Method::PUT, "/flows/update_name", Some(&cookie), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, listing) = send(&app, request(Method::GET, "/flows", Some(&cookie), None)).await;
    assert_eq!(listing[0]["topic"], "Databases");

    let (_, _, doc) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(doc["flow"]["nodes"][0]["data"]["label"], "Databases");
}

#[rstest]
#[case::empty("")]
#[case::whitespace("   ")]
#[tokio::test]
async fn rename_rejects_blank_topics_and_changes_nothing(#[case] topic: &str) {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &cookie).await;

    let body = json!({ "flowId": flow_id, "topic": topic });
    let (status, _, response) = send(
        &app,
        request(Method::PUT, "/flows/update_name", Some(&cookie), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Topic is missing.");

    let (_, _, listing) = send(&app, request(Method::GET, "/flows", Some(&cookie), None)).await;
    assert_eq!(listing[0]["topic"], "New Topic");
    let (_, _, doc) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(doc["flow"]["nodes"][0]["data"]["label"], "New Topic");
}

#[tokio::test]
async fn deleting_a_flow_removes_its_notes_and_summary_entry() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &cookie).await;
    let note_id = create_note(&app, &cookie, &flow_id).await;

    let (status, _, _) = send(
        &app,
        request(
            Method::DELETE,
            "/flows",
            Some(&cookie),
            Some(json!({ "flowId": flow_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, listing) = send(&app, request(Method::GET, "/flows", Some(&cookie), None)).await;
    assert_eq!(listing, json!([]));

    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/notes/{note_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case::flows("/flows/not-a-uuid", "Flowchart ID is not valid.")]
#[case::notes("/notes/not-a-uuid", "Note ID is not valid.")]
#[tokio::test]
async fn malformed_document_ids_are_rejected(#[case] uri: &str, #[case] message: &str) {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let (status, _, body) = send(&app, request(Method::GET, uri, Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], message);
}

#[tokio::test]
async fn missing_flow_is_a_404() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let ghost = uuid::Uuid::new_v4();
    let (status, _, body) = send(
        &app,
        request(Method::GET, &format!("/flows/{ghost}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Flowchart not found.");
}

// ---- notes --------------------------------------------------------------

#[tokio::test]
async fn note_lifecycle_create_read_update_delete() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &cookie).await;

    let (status, _, created) = send(
        &app,
        request(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({ "flowId": flow_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let note_id = created["id"].as_str().expect("note id").to_owned();
    assert!(created["updatedAt"].is_string());

    let (status, _, fetched) = send(
        &app,
        request(Method::GET, &format!("/notes/{note_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched["content"],
        json!([{ "type": "heading", "content": "Title" }])
    );

    let blocks = json!([{ "type": "paragraph", "content": "hello world" }]);
    let (status, _, _) = send(
        &app,
        request(
            Method::PUT,
            &format!("/notes/{note_id}"),
            Some(&cookie),
            Some(json!({ "content": blocks })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, fetched) = send(
        &app,
        request(Method::GET, &format!("/notes/{note_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(fetched["content"], blocks);

    let (status, _, _) = send(
        &app,
        request(
            Method::DELETE,
            "/notes",
            Some(&cookie),
            Some(json!({ "noteId": note_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/notes/{note_id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn note_creation_requires_an_owned_flow() {
    let app = test_app().await;
    let cookie = signup(&app, "ada", "ada@example.com").await;

    let (status, _, body) = send(
        &app,
        request(Method::POST, "/notes", Some(&cookie), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Flowchart ID is not valid.");

    let ghost = uuid::Uuid::new_v4();
    let (status, _, _) = send(
        &app,
        request(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({ "flowId": ghost.to_string() })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---- cross-user isolation ----------------------------------------------

#[tokio::test]
async fn foreign_documents_are_forbidden_regardless_of_operation() {
    let app = test_app().await;
    let owner = signup(&app, "ada", "ada@example.com").await;
    let flow_id = create_flow(&app, &owner).await;
    let note_id = create_note(&app, &owner, &flow_id).await;

    let intruder = signup(&app, "mallory", "mallory@example.com").await;

    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&intruder), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        request(
            Method::PUT,
            &format!("/flows/{flow_id}"),
            Some(&intruder),
            Some(json!({ "flowchart": { "nodes": [], "edges": [], "viewport": {"x": 0, "y": 0, "zoom": 1} } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        request(
            Method::DELETE,
            "/flows",
            Some(&intruder),
            Some(json!({ "flowId": flow_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/notes/{note_id}"), Some(&intruder), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        request(
            Method::POST,
            "/notes",
            Some(&intruder),
            Some(json!({ "flowId": flow_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner's documents are intact.
    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/flows/{flow_id}"), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ---- surface-wide -------------------------------------------------------

#[tokio::test]
async fn unmatched_routes_return_the_json_404() {
    let app = test_app().await;
    let (status, _, body) = send(&app, request(Method::GET, "/no/such/route", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Page Not Found");
}

#[tokio::test]
async fn oversized_bodies_are_rejected_before_deserialization() {
    let app = test_app().await;
    let padding = "x".repeat(6 * 1024 * 1024);
    let body = json!({ "username": "ada", "email": "ada@example.com", "password": padding });
    let (status, _, response) = send(&app, request(Method::POST, "/signup", None, Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = response["message"].as_str().expect("message");
    assert!(message.contains("length limit"));
}

#[tokio::test]
async fn unparseable_bodies_keep_the_json_error_shape() {
    let app = test_app().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/signup")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}
