use crate::auth::AuthService;
use crate::error::{ AuthError, RelayError };
use crate::models::api::{ ChatReply, ChatRequest, CredentialsRequest, MessageResponse, TokenResponse };
use crate::relay::ChatRelay;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ rejection::JsonRejection, State },
    response::{ IntoResponse, Response },
    http::{ header::AUTHORIZATION, HeaderMap, StatusCode },
    middleware,
};
use serde_json::json;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

use super::rate_limit::{ enforce_rate_limit, SharedRateLimiter };

pub const SERVICE_ERROR_REPLY: &str = "AI service error.";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub auth: Option<AuthService>,
    pub require_auth: bool,
}

pub fn build_router(state: AppState, rate_limiter: Option<SharedRateLimiter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler));

    if state.auth.is_some() {
        app = app
            .route("/api/auth/register", post(register_handler))
            .route("/api/auth/login", post(login_handler));
    }

    let mut app = app.with_state(state);

    if let Some(limiter) = rate_limiter {
        app = app.layer(middleware::from_fn_with_state(limiter, enforce_rate_limit));
    }

    app.layer(cors)
}

fn chat_response(code: StatusCode, reply: impl Into<String>) -> Response {
    (code, Json(ChatReply { reply: reply.into() })).into_response()
}

fn message_response(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(MessageResponse { message: message.into() })).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `Err` carries the response to send when the request is not authorised.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    if !state.require_auth {
        return Ok(());
    }
    let Some(auth) = &state.auth else {
        error!("Auth required but no auth service configured");
        return Err(chat_response(StatusCode::INTERNAL_SERVER_ERROR, SERVICE_ERROR_REPLY));
    };
    let Some(token) = bearer_token(headers) else {
        return Err(chat_response(StatusCode::UNAUTHORIZED, "Access denied. No token provided."));
    };
    match auth.verify(token) {
        Ok(claims) => {
            info!("Authenticated chat request for {}", claims.sub);
            Ok(())
        }
        Err(e) => {
            warn!("Rejected token: {}", e);
            Err(chat_response(StatusCode::FORBIDDEN, "Invalid token."))
        }
    }
}

async fn root_handler() -> &'static str {
    "AegisAI backend running"
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Malformed chat body: {}", rejection);
            return chat_response(StatusCode::BAD_REQUEST, RelayError::Validation.to_string());
        }
    };

    match state.relay.process_message(&req.user_id, &req.message).await {
        Ok(reply) => chat_response(StatusCode::OK, reply),
        Err(e @ RelayError::Validation) => chat_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            error!("Chat request failed: {}", e);
            chat_response(StatusCode::INTERNAL_SERVER_ERROR, SERVICE_ERROR_REPLY)
        }
    }
}

fn auth_error_response(e: AuthError) -> Response {
    match e {
        AuthError::MissingFields | AuthError::UserExists | AuthError::InvalidCredentials => {
            message_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        AuthError::InvalidToken(_) => message_response(StatusCode::FORBIDDEN, "Invalid token."),
        AuthError::TokenExpiry
        | AuthError::Hash(_)
        | AuthError::HashTask(_)
        | AuthError::Store(_) => {
            error!("Auth failure: {}", e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let Some(auth) = state.auth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(Json(req)) = body else {
        return auth_error_response(AuthError::MissingFields);
    };

    match auth.register(&req.email, &req.password).await {
        Ok(()) => message_response(StatusCode::CREATED, "User registered successfully"),
        Err(e) => auth_error_response(e),
    }
}

async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let Some(auth) = state.auth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(Json(req)) = body else {
        return auth_error_response(AuthError::MissingFields);
    };

    match auth.login(&req.email, &req.password).await {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(e) => auth_error_response(e),
    }
}
