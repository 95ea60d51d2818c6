use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use rolechat_ai::{LlmClient, MockLlmClient, MockStep};
use rolechat_core::{AppCore, registry::StaticPersonaRegistry, streaming::StreamSettings};
use rolechat_server::{
    api::state::AppState,
    app,
    middleware::{Claims, JwtVerifier},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct TestApp {
    _dir: TempDir,
    router: Router,
    llm: MockLlmClient,
}

fn test_app(with_llm: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let llm = MockLlmClient::new("mock").with_recording();
    let client: Option<Arc<dyn LlmClient>> = with_llm.then(|| Arc::new(llm.clone()) as Arc<dyn LlmClient>);
    let core = AppCore::new(
        dir.path().join("api.db"),
        Arc::new(StaticPersonaRegistry::builtin().unwrap()),
        client,
        StreamSettings::default(),
    )
    .unwrap();
    let state = AppState::new(Arc::new(core), JwtVerifier::new(SECRET), CancellationToken::new());

    TestApp {
        _dir: dir,
        router: app(state),
        llm,
    }
}

fn token_for(user_id: u64, token_type: &str) -> String {
    let claims = Claims {
        user_id,
        role: "user".to_string(),
        status: None,
        token_type: token_type.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn post_json(uri: &str, user_id: u64, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id, "access")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, user_id: u64) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id, "access")))
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(router, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = test_app(true);
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();

    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn rejects_missing_malformed_and_refresh_credentials() {
    let app = test_app(true);

    let request = Request::builder().uri("/api/chat/topics").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authorization header is required");

    let request = Request::builder()
        .uri("/api/chat/topics")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send_json(&app.router, request).await;
    assert_eq!(body["error"], "invalid authorization header format");

    let request = Request::builder()
        .uri("/api/chat/topics")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(1, "refresh")))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong token type");
}

#[tokio::test]
async fn streams_reply_and_persists_both_turns() {
    let app = test_app(true);
    app.llm
        .push_script(vec![
            MockStep::token("我是赫敏，"),
            MockStep::token("很高兴认识你"),
            MockStep::token("\n再见"),
        ])
        .await;

    let (status, headers, body) = send(
        &app.router,
        post_json(
            "/api/chat/role-reply/stream",
            1,
            json!({"topic_id": 0, "role_id": "hermione", "persona_name": "ron", "content": "你好"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
    assert_eq!(headers[header::CONNECTION], "keep-alive");
    assert_eq!(headers["x-accel-buffering"], "no");
    assert_eq!(
        body,
        "data: 我是赫敏，\n\ndata: 很高兴认识你\\n再见\n\ndata: [DONE]\n\n"
    );

    // role_id wins over persona_name.
    let sent = app.llm.requests().await;
    assert!(sent[0].messages[0].content.contains("赫敏"));

    let (_, topics) = send_json(&app.router, get("/api/chat/topics", 1)).await;
    assert_eq!(topics.as_array().unwrap().len(), 1);
    assert_eq!(topics[0]["title"], "你好");
    let topic_id = topics[0]["id"].as_u64().unwrap();

    let (status, messages) =
        send_json(&app.router, get(&format!("/api/chat/topics/{}/messages", topic_id), 1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "你好");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "我是赫敏，很高兴认识你\n再见");
}

#[tokio::test]
async fn upstream_error_sends_error_event_and_keeps_only_user_turn() {
    let app = test_app(true);
    app.llm
        .push_script(vec![MockStep::token("半"), MockStep::error("quota\nexceeded")])
        .await;

    let (status, _, body) = send(
        &app.router,
        post_json(
            "/api/chat/role-reply/stream",
            1,
            json!({"persona_name": "harry", "content": "hi"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "event: error\ndata: LLM error: quota exceeded\n\n");

    let (_, topics) = send_json(&app.router, get("/api/chat/topics", 1)).await;
    let topic_id = topics[0]["id"].as_u64().unwrap();
    let (_, messages) =
        send_json(&app.router, get(&format!("/api/chat/topics/{}/messages", topic_id), 1)).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn pre_stream_failures_are_json_errors() {
    let app = test_app(true);

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/api/chat/role-reply/stream",
            1,
            json!({"role_id": "voldemort", "content": "hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role/persona: voldemort");

    let (status, _) = send_json(
        &app.router,
        post_json(
            "/api/chat/role-reply/stream",
            1,
            json!({"topic_id": 42, "role_id": "ron", "content": "hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, topics) = send_json(&app.router, get("/api/chat/topics", 1)).await;
    assert!(topics.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn topics_are_private_to_their_owner() {
    let app = test_app(true);

    let (status, created) = send_json(
        &app.router,
        post_json("/api/chat/message", 1, json!({"topic_id": 0, "content": "secret plans"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["new_topic"], true);
    assert_eq!(created["message"]["role"], "user");
    let topic_id = created["topic"]["id"].as_u64().unwrap();

    let (status, body) =
        send_json(&app.router, get(&format!("/api/chat/topics/{}/messages", topic_id), 2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send_json(
        &app.router,
        post_json(
            "/api/chat/role-reply/stream",
            2,
            json!({"topic_id": topic_id, "role_id": "ron", "content": "let me in"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(
        &app.router,
        post_json("/api/chat/message", 1, json!({"topic_id": topic_id, "role": "tool", "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, theirs) = send_json(&app.router, get("/api/chat/topics", 2)).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stream_route_absent_without_upstream() {
    let app = test_app(false);

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/chat/role-reply/stream",
            1,
            json!({"role_id": "ron", "content": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app.router, get("/api/chat/topics", 1)).await;
    assert_eq!(status, StatusCode::OK);
}
