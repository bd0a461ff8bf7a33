use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use gchat_api::AppStateInner;
use gchat_db::{MemStore, Storage};
use gchat_types::api::Claims;

const SECRET: &str = "test-secret";

fn app() -> (Router, Arc<MemStore>) {
    let store = Arc::new(MemStore::new());
    let state = Arc::new(AppStateInner {
        store: store.clone(),
        jwt_secret: SECRET.into(),
        cookie_domain: "localhost".into(),
    });
    (gchat_api::routes(state), store)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(req: Request<Body>, cookie: &str) -> Request<Body> {
    let (mut parts, body) = req.into_parts();
    parts.headers.insert(header::COOKIE, cookie.parse().unwrap());
    Request::from_parts(parts, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    // Just the `name=value` pair, usable as a Cookie header.
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        cookie,
        body,
    }
}

async fn register(app: &Router, username: &str, password: &str) -> Reply {
    send(
        app,
        post_json(
            "/api/register",
            json!({ "username": username, "passwordHashed": password }),
        ),
    )
    .await
}

#[tokio::test]
async fn register_sets_session_cookie_and_hides_the_hash() {
    let (app, _store) = app();

    let reply = register(&app, "alice", "hunter2").await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["username"], "alice");
    assert!(reply.body.get("passwordHashed").is_none());

    let cookie = reply.cookie.expect("register must set a cookie");
    assert!(cookie.starts_with("accessToken="));
}

#[tokio::test]
async fn register_cookie_attributes() {
    let (app, _store) = app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            json!({ "username": "alice", "passwordHashed": "hunter2" }),
        ))
        .await
        .unwrap();

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Domain=localhost"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    // 30 days
    assert!(set_cookie.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn duplicate_register_conflicts_and_creates_nothing() {
    let (app, store) = app();

    assert_eq!(register(&app, "alice", "hunter2").await.status, StatusCode::CREATED);

    let reply = register(&app, "alice", "hunter3").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn malformed_register_body_is_a_client_error() {
    let (app, store) = app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = send(&app, req).await;
    assert!(reply.status.is_client_error());
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn login_failures_are_opaque_and_identical() {
    let (app, store) = app();
    register(&app, "alice", "hunter2").await;

    let unknown = send(
        &app,
        post_json(
            "/api/login",
            json!({ "username": "bob", "passwordHashed": "whatever" }),
        ),
    )
    .await;
    let wrong = send(
        &app,
        post_json(
            "/api/login",
            json!({ "username": "alice", "passwordHashed": "hunter3" }),
        ),
    )
    .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    // Identical bodies: an attacker cannot tell which check failed.
    assert_eq!(unknown.body, wrong.body);
    assert!(unknown.cookie.is_none());
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn login_succeeds_with_the_right_password() {
    let (app, _store) = app();
    register(&app, "alice", "hunter2").await;

    let reply = send(
        &app,
        post_json(
            "/api/login",
            json!({ "username": "alice", "passwordHashed": "hunter2" }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["username"], "alice");
    assert!(reply.cookie.unwrap().starts_with("accessToken="));
}

#[tokio::test]
async fn protected_route_requires_a_valid_session() {
    let (app, store) = app();
    let registered = register(&app, "alice", "hunter2").await;
    let cookie = registered.cookie.unwrap();
    let user_id = registered.body["id"].as_i64().unwrap();

    // No cookie at all.
    let reply = send(&app, get("/api/me")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Tampered signature.
    let mut tampered = cookie.clone();
    tampered.push('x');
    let reply = send(&app, with_cookie(get("/api/me"), &tampered)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Expired token, signed with the real secret.
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize,
        },
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let reply = send(
        &app,
        with_cookie(get("/api/me"), &format!("accessToken={}", expired)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Properly signed token whose subject is not a numeric id.
    let bad_sub = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: "alice".into(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(2)).timestamp() as usize,
        },
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let reply = send(
        &app,
        with_cookie(get("/api/me"), &format!("accessToken={}", bad_sub)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // The happy path, for contrast.
    let reply = send(&app, with_cookie(get("/api/me"), &cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["id"].as_i64().unwrap(), user_id);

    // A well-formed token for a user that no longer exists.
    store.delete_user_by_id(user_id).unwrap();
    let reply = send(&app, with_cookie(get("/api/me"), &cookie)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_membership_lands_on_the_user_record() {
    let (app, _store) = app();
    let cookie = register(&app, "alice", "hunter2").await.cookie.unwrap();
    register(&app, "bob", "hunter2").await;

    let chat = send(
        &app,
        with_cookie(
            post_json("/api/chats", json!({ "usernames": ["alice", "bob"] })),
            &cookie,
        ),
    )
    .await;
    assert_eq!(chat.status, StatusCode::CREATED);
    let chat_id = chat.body["id"].as_i64().unwrap();

    let me = send(&app, with_cookie(get("/api/me"), &cookie)).await;
    assert_eq!(me.body["chatIds"], json!([chat_id]));
}

#[tokio::test]
async fn messages_list_newest_first() {
    let (app, _store) = app();
    let cookie = register(&app, "alice", "hunter2").await.cookie.unwrap();

    let chat = send(
        &app,
        with_cookie(
            post_json("/api/chats", json!({ "usernames": ["alice"] })),
            &cookie,
        ),
    )
    .await;
    let chat_id = chat.body["id"].as_i64().unwrap();

    let uri = format!("/api/chats/{}/messages", chat_id);
    let sent = send(
        &app,
        with_cookie(
            post_json(
                &uri,
                json!([
                    { "text": "first", "timestamp": 10 },
                    { "text": "second", "timestamp": 30 },
                    { "text": "third", "timestamp": 20 },
                ]),
            ),
            &cookie,
        ),
    )
    .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    // Author comes from the session, not the payload.
    assert_eq!(sent.body[0]["authorName"], "alice");

    let listed = send(&app, with_cookie(get(&uri), &cookie)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let timestamps: Vec<i64> = listed.body.as_array().unwrap().iter()
        .map(|m| m["timestamp"].as_i64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![30, 20, 10]);
}

#[tokio::test]
async fn messages_for_a_missing_chat_are_not_found() {
    let (app, store) = app();
    let cookie = register(&app, "alice", "hunter2").await.cookie.unwrap();

    let reply = send(
        &app,
        with_cookie(
            post_json("/api/chats/999/messages", json!([{ "text": "hi" }])),
            &cookie,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(store.message_count(), 0);
}

#[tokio::test]
async fn deleting_a_chat_removes_messages_and_membership() {
    let (app, store) = app();
    let cookie = register(&app, "alice", "hunter2").await.cookie.unwrap();

    let chat = send(
        &app,
        with_cookie(
            post_json("/api/chats", json!({ "usernames": ["alice"] })),
            &cookie,
        ),
    )
    .await;
    let chat_id = chat.body["id"].as_i64().unwrap();

    send(
        &app,
        with_cookie(
            post_json(
                &format!("/api/chats/{}/messages", chat_id),
                json!([{ "text": "hello", "timestamp": 1 }]),
            ),
            &cookie,
        ),
    )
    .await;
    assert_eq!(store.message_count(), 1);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/chats/{}", chat_id))
        .body(Body::empty())
        .unwrap();
    let reply = send(&app, with_cookie(req, &cookie)).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(store.message_count(), 0);

    let me = send(&app, with_cookie(get("/api/me"), &cookie)).await;
    assert_eq!(me.body["chatIds"], json!([]));
}
