//! REST API server for the query router
//!
//! The router is synchronous and builds a runtime per query, so every turn
//! runs on tokio's blocking pool and never stalls the server's workers.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

use crate::router::QueryRouter;
use crate::session::{Session, Turn, TurnRole};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub chat_id: Option<String>,
    pub user_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassifyRequest {
    pub text: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub router: Arc<QueryRouter>,
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Version 4 and RFC4122 variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

fn parse_or_stable_uuid(value: Option<&str>, fallback_seed: &str) -> uuid::Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string(fallback_seed),
    }
}

/// Transcript up to and including the last user message
fn session_from_messages(messages: &[ChatMessage], last_user_index: usize) -> Session {
    Session::from_turns(
        messages[..=last_user_index]
            .iter()
            .map(|m| Turn::new(TurnRole::parse(&m.role), m.content.clone()))
            .collect(),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let Some(last_user_index) = req
        .messages
        .iter()
        .rposition(|m| TurnRole::parse(&m.role) == TurnRole::User)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        );
    };

    let chat_id = parse_or_stable_uuid(req.chat_id.as_deref(), "anonymous-chat");
    let user_id = parse_or_stable_uuid(
        req.user_id.as_deref(),
        req.chat_id.as_deref().unwrap_or("anonymous-user"),
    );

    let text = req.messages[last_user_index].content.clone();
    let session = session_from_messages(&req.messages, last_user_index);
    // Router logs for this turn nest under the chat span on the blocking thread
    let span = info_span!("chat", %chat_id, %user_id);
    span.in_scope(|| info!(turns = session.len(), "Chat request"));

    let router = Arc::clone(&state.router);
    let outcome =
        tokio::task::spawn_blocking(move || span.in_scope(|| router.handle(&text, &session))).await;

    match outcome {
        Ok(response) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "answer": response.text,
                "source": response.source,
                "kind": response.kind,
                "chat_id": chat_id.to_string(),
                "user_id": user_id.to_string(),
            }))),
        ),
        Err(e) => {
            error!(%chat_id, error = %e, "Router task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to handle message".into())),
            )
        }
    }
}

/// =============================
/// Classify Endpoint
/// =============================

async fn classify_handler(
    State(state): State<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let classification = state.router.classify(&req.text);
    let decision = state
        .router
        .decide(&classification, &Session::from_turns(vec![Turn::user(req.text)]));

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "classification": classification,
            "decision": decision,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(router: Arc<QueryRouter>) -> Router {
    let state = ApiState { router };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/classify", post(classify_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    router: Arc<QueryRouter>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app = create_router(router);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::knowledge;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(Arc::new(QueryRouter::offline()))
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, ApiResponse) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_stable_uuid() {
        let a = parse_or_stable_uuid(Some("chat-42"), "seed");
        let b = parse_or_stable_uuid(Some("chat-42"), "seed");
        assert_eq!(a, b);
        assert_eq!(a.get_version_num(), 4);

        let real = uuid::Uuid::new_v4();
        assert_eq!(parse_or_stable_uuid(Some(&real.to_string()), "seed"), real);
        assert_eq!(parse_or_stable_uuid(Some("  "), "seed"), stable_uuid_from_string("seed"));
    }

    #[test]
    fn test_session_stops_at_last_user_message() {
        let messages = vec![
            ChatMessage { role: "user".into(), content: "hi".into() },
            ChatMessage { role: "assistant".into(), content: "Hello!".into() },
            ChatMessage { role: "user".into(), content: "When did World War II end?".into() },
            ChatMessage { role: "assistant".into(), content: "pending".into() },
        ];

        let session = session_from_messages(&messages, 2);
        assert_eq!(session.len(), 3);
        assert_eq!(session.last_user_utterance(), Some("When did World War II end?"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_chat_endpoint() {
        let (status, body) = post_json(
            app(),
            "/api/chat",
            serde_json::json!({
                "chat_id": "history-chat",
                "messages": [{ "role": "user", "content": "When did World War II end?" }]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        let data = body.data.unwrap();
        assert_eq!(data["answer"], knowledge::WORLD_WAR_II_END);
        assert_eq!(data["kind"], "historical_fact");
        assert_eq!(data["chat_id"], stable_uuid_from_string("history-chat").to_string());
        // Without a user id the chat id seeds it, so one chat keeps one user
        assert_eq!(data["user_id"], stable_uuid_from_string("history-chat").to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_chat_accepts_any_user_role_spelling() {
        for role in ["User", "HUMAN", " user "] {
            let (status, body) = post_json(
                app(),
                "/api/chat",
                serde_json::json!({
                    "messages": [{ "role": role, "content": "When did World War II end?" }]
                }),
            )
            .await;

            assert_eq!(status, StatusCode::OK, "role: {:?}", role);
            assert_eq!(body.data.unwrap()["answer"], knowledge::WORLD_WAR_II_END);
        }
    }

    #[tokio::test]
    async fn test_chat_without_user_message() {
        let (status, body) = post_json(
            app(),
            "/api/chat",
            serde_json::json!({
                "messages": [{ "role": "assistant", "content": "Hello!" }]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let (status, body) = post_json(
            app(),
            "/api/classify",
            serde_json::json!({ "text": "What is the price of $TSLA?" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["classification"]["intent"], "stock_price");
        assert_eq!(data["classification"]["entities"]["ticker"], "TSLA");
        assert_eq!(data["decision"]["mode"], "direct_action");
    }
}
