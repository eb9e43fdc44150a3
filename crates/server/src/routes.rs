//! JSON API routes.
//!
//! - `POST /process-image`       — extract and store a receipt image
//! - `POST /create-wallet-pass`  — mint a save-to-wallet URL for a grocery list
//! - `POST /chat`                — route one conversational question

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use receiptly_agent::{AgentRouter, ReceiptPipeline};
use receiptly_core::domain::pass::GroceryPassRequest;
use receiptly_wallet::{WalletClient, WalletError};

/// The one outbound call the pass endpoint needs; a seam so tests can script
/// pass issuance without Wallet API credentials.
#[async_trait]
pub trait PassIssuer: Send + Sync {
    async fn create_pass_token(
        &self,
        email: &str,
        request: &GroceryPassRequest,
    ) -> Result<String, WalletError>;
}

#[async_trait]
impl PassIssuer for WalletClient {
    async fn create_pass_token(
        &self,
        email: &str,
        request: &GroceryPassRequest,
    ) -> Result<String, WalletError> {
        WalletClient::create_pass_token(self, email, request).await
    }
}

#[derive(Clone)]
pub struct AppState {
    router: Arc<AgentRouter>,
    pipeline: Arc<ReceiptPipeline>,
    wallet: Arc<dyn PassIssuer>,
}

impl AppState {
    pub fn new(
        router: Arc<AgentRouter>,
        pipeline: Arc<ReceiptPipeline>,
        wallet: Arc<dyn PassIssuer>,
    ) -> Self {
        Self { router, pipeline, wallet }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessImageRequest {
    #[serde(rename = "imageData")]
    image_data: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePassRequest {
    email: Option<String>,
    #[serde(rename = "passData")]
    pass_data: Option<GroceryPassRequest>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process-image", post(process_image))
        .route("/create-wallet-pass", post(create_wallet_pass))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn process_image(
    State(state): State<AppState>,
    Json(request): Json<ProcessImageRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (Some(image_data), Some(user_id)) = (request.image_data, request.user_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing 'imageData' or 'userId'"})),
        );
    };

    match state.pipeline.ingest(&image_data, &user_id).await {
        Ok(doc_id) => {
            info!(event_name = "api.process_image.stored", doc_id = %doc_id.0, "receipt stored");
            (
                StatusCode::CREATED,
                Json(json!({"message": "Image processed successfully", "docId": doc_id.0})),
            )
        }
        Err(err) => {
            error!(event_name = "api.process_image.failed", error = %err, "image processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": err.to_string()})))
        }
    }
}

async fn create_wallet_pass(
    State(state): State<AppState>,
    Json(request): Json<CreatePassRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (Some(email), Some(pass_data)) = (request.email, request.pass_data) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing 'email' or 'passData' in request"})),
        );
    };

    match state.wallet.create_pass_token(&email, &pass_data).await {
        Ok(save_url) => (StatusCode::OK, Json(json!({"saveUrl": save_url}))),
        Err(err) => {
            error!(event_name = "api.create_wallet_pass.failed", error = %err, "pass issuance failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": err.to_string()})))
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (Some(question), Some(user_id)) = (request.question, request.user_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing 'question' or 'userId'"})),
        );
    };

    match state
        .router
        .answer_question(&user_id, &question, request.session_id.as_deref())
        .await
    {
        Ok(response) => {
            let payload = serde_json::to_value(&response).unwrap_or_else(
                |err| json!({"type": "error", "content": err.to_string()}),
            );
            (StatusCode::OK, Json(payload))
        }
        Err(err) => {
            error!(event_name = "api.chat.failed", error = %err, "chat handling failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"type": "error", "content": err.to_string()})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use receiptly_agent::llm::{ImageAttachment, LlmClient};
    use receiptly_agent::tools::{LocationResolver, PriceSearch};
    use receiptly_agent::{AgentRouter, ReceiptPipeline};
    use receiptly_core::domain::pass::GroceryPassRequest;
    use receiptly_core::domain::price::{Location, PriceLookup};
    use receiptly_db::repositories::{InMemoryChatHistoryRepository, InMemoryReceiptRepository};
    use receiptly_wallet::WalletError;

    use super::{router, AppState, PassIssuer};

    struct ScriptedLlm {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.replies.lock().unwrap().pop().expect("unexpected model call"))
        }

        async fn complete_with_image(
            &self,
            prompt: &str,
            _image: &ImageAttachment,
        ) -> anyhow::Result<String> {
            self.complete(prompt).await
        }
    }

    struct NoSearch;

    #[async_trait]
    impl PriceSearch for NoSearch {
        async fn search(&self, _query: &str, _location: &Location) -> PriceLookup {
            PriceLookup::Unavailable { reason: "unused".to_string() }
        }
    }

    struct HomeLocator;

    #[async_trait]
    impl LocationResolver for HomeLocator {
        async fn resolve(&self) -> Location {
            Location::default()
        }
    }

    struct StubIssuer;

    #[async_trait]
    impl PassIssuer for StubIssuer {
        async fn create_pass_token(
            &self,
            _email: &str,
            _request: &GroceryPassRequest,
        ) -> Result<String, WalletError> {
            Ok("https://pay.google.com/gp/v/save/stub-token".to_string())
        }
    }

    fn app(replies: &[&str]) -> axum::Router {
        let llm = ScriptedLlm::new(replies);
        let receipts = Arc::new(InMemoryReceiptRepository::default());
        let chat_history = Arc::new(InMemoryChatHistoryRepository::default());
        let agent_router = Arc::new(AgentRouter::new(
            llm.clone(),
            receipts.clone(),
            chat_history,
            Arc::new(NoSearch),
            Arc::new(HomeLocator),
        ));
        let pipeline = Arc::new(ReceiptPipeline::new(llm, receipts));

        router(AppState::new(agent_router, pipeline, Arc::new(StubIssuer)))
    }

    async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request should build"),
            )
            .await
            .expect("request should run");

        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[tokio::test]
    async fn process_image_requires_both_fields() {
        let (status, body) =
            post_json(app(&[]), "/process-image", json!({"userId": "user-1"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'imageData' or 'userId'");
    }

    #[tokio::test]
    async fn process_image_returns_created_with_a_doc_id() {
        let reply = r#"{"items": [{"name": "Milk", "price": 2.50}], "purchase_date": "2025-07-27"}"#;
        let (status, body) = post_json(
            app(&[reply]),
            "/process-image",
            json!({"imageData": "data:image/png;base64,aGVsbG8=", "userId": "user-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Image processed successfully");
        assert!(body["docId"].as_str().expect("doc id").len() > 0);
    }

    #[tokio::test]
    async fn process_image_faults_are_500_with_an_error_body() {
        let (status, body) = post_json(
            app(&["this is not json"]),
            "/process-image",
            json!({"imageData": "data:image/png;base64,aGVsbG8=", "userId": "user-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().expect("error message").len() > 0);
    }

    #[tokio::test]
    async fn create_wallet_pass_requires_both_fields() {
        let (status, body) =
            post_json(app(&[]), "/create-wallet-pass", json!({"email": "a@b.com"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'email' or 'passData' in request");
    }

    #[tokio::test]
    async fn create_wallet_pass_returns_the_save_url() {
        let (status, body) = post_json(
            app(&[]),
            "/create-wallet-pass",
            json!({
                "email": "shopper@example.com",
                "passData": {"user_id": "shopper@example.com", "items": [{"name": "milk"}]}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saveUrl"], "https://pay.google.com/gp/v/save/stub-token");
    }

    #[tokio::test]
    async fn chat_requires_question_and_user_id() {
        let (status, body) = post_json(app(&[]), "/chat", json!({"question": "hi"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'question' or 'userId'");
    }

    #[tokio::test]
    async fn chat_returns_the_routed_response_shape() {
        let (status, body) = post_json(
            app(&["GENERAL_QUESTION"]),
            "/chat",
            json!({"question": "what did I buy?", "userId": "user-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "text");
        assert_eq!(body["content"], "No receipt data found. Please upload a receipt image first.");
    }

    #[tokio::test]
    async fn chat_with_an_empty_user_id_is_a_routed_error() {
        let (status, body) = post_json(
            app(&[]),
            "/chat",
            json!({"question": "anything", "userId": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "error");
        assert_eq!(body["content"], "User ID is required.");
    }
}
