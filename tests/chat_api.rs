use aegis_relay::auth::{ jwt::TokenSigner, AuthService };
use aegis_relay::config::prompt::PromptConfig;
use aegis_relay::error::{ LlmError, SearchError };
use aegis_relay::history::{ ConversationStore, MemoryStore };
use aegis_relay::llm::chat::{ ChatClient, CompletionResponse, PromptMessage };
use aegis_relay::models::chat::Role;
use aegis_relay::relay::ChatRelay;
use aegis_relay::search::{ SearchClient, SearchHit };
use aegis_relay::server::api::{ build_router, AppState };
use aegis_relay::server::rate_limit::rate_limiter;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{ Request, StatusCode };
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use tower::ServiceExt;

struct StubChat {
    reply: Result<String, ()>,
    prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl StubChat {
    fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { reply: Err(()), prompts: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for StubChat {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<CompletionResponse, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Ok(text) => Ok(CompletionResponse { response: text.clone() }),
            Err(()) => Err(LlmError::MissingApiKey("stub")),
        }
    }

    fn get_model(&self) -> String {
        "stub-model".into()
    }

    fn get_base_url(&self) -> String {
        "http://stub".into()
    }
}

struct BrokenSearch;

#[async_trait]
impl SearchClient for BrokenSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::MissingApiKey)
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    chat: Arc<StubChat>,
}

fn app_with(chat: Arc<StubChat>, require_auth: bool, rate_limit: u32) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let relay = ChatRelay::new(store.clone(), chat.clone(), Arc::new(PromptConfig::default()))
        .with_search(Some(Arc::new(BrokenSearch) as Arc<dyn SearchClient>));
    let auth = AuthService::new(
        store.clone(),
        TokenSigner::new("integration-secret", chrono::Duration::hours(1))
    );
    let state = AppState {
        relay: Arc::new(relay),
        auth: Some(auth),
        require_auth,
    };
    TestApp {
        router: build_router(state, rate_limiter(rate_limit)),
        store,
        chat,
    }
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn hello_returns_stub_reply_and_stores_two_messages() {
    let app = app_with(StubChat::ok("Hi there"), false, 0);

    let (status, body) = send(
        &app.router,
        post_json("/chat", json!({ "message": "Hello", "userId": "u1" }), None)
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "Hi there" }));

    let conversation = app.store.load("u1").await.unwrap().unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, Role::User);
    assert_eq!(conversation.messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn failed_search_adds_no_system_message() {
    let app = app_with(StubChat::ok("ok"), false, 0);

    let (status, _) = send(
        &app.router,
        post_json("/chat", json!({ "message": "news", "userId": "u1" }), None)
    ).await;
    assert_eq!(status, StatusCode::OK);

    let prompts = app.chat.prompts.lock().unwrap();
    let system_count = prompts[0].iter().filter(|m| m.role == Role::System).count();
    assert_eq!(system_count, 1);
}

#[tokio::test]
async fn missing_fields_are_rejected_before_upstream_calls() {
    let app = app_with(StubChat::ok("unused"), false, 0);

    for body in [
        json!({ "message": "hi" }),
        json!({ "userId": "u1" }),
        json!({ "message": "", "userId": "u1" }),
        json!({}),
    ] {
        let (status, reply) = send(&app.router, post_json("/chat", body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["reply"], "Message and userId required.");
    }

    let malformed = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app.router, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.chat.calls(), 0);
}

#[tokio::test]
async fn upstream_failure_is_a_generic_500_and_server_keeps_serving() {
    let app = app_with(StubChat::failing(), false, 0);

    let (status, body) = send(
        &app.router,
        post_json("/chat", json!({ "message": "Hello", "userId": "u1" }), None)
    ).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "reply": "AI service error." }));

    let response = app.router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&text[..], b"AegisAI backend running");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(StubChat::ok("x"), false, 0);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_then_authenticated_chat() {
    let app = app_with(StubChat::ok("secured"), true, 0);
    let creds = json!({ "email": "me@example.com", "password": "pw" });

    let (status, _) = send(&app.router, post_json("/api/auth/register", creds.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app.router, post_json("/api/auth/register", creds.clone(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = send(&app.router, post_json("/api/auth/login", creds, None)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let chat = json!({ "message": "Hello", "userId": "u1" });
    let (status, body) = send(&app.router, post_json("/chat", chat.clone(), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "secured");

    let (status, _) = send(&app.router, post_json("/chat", chat.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, post_json("/chat", chat, Some("forged"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bad_login_is_a_400() {
    let app = app_with(StubChat::ok("x"), false, 0);
    let (status, body) = send(
        &app.router,
        post_json("/api/auth/login", json!({ "email": "ghost@example.com", "password": "pw" }), None)
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn rate_limit_returns_429() {
    let app = app_with(StubChat::ok("x"), false, 2);

    for _ in 0..2 {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, _) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::OK);
    }
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
