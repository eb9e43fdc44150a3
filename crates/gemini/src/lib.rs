//! Vertex AI Gemini client.
//!
//! One HTTP call per completion against the regional `generateContent`
//! endpoint, authenticated with a bearer token from [`receiptly_gauth`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use receiptly_agent::llm::{ImageAttachment, LlmClient};
use receiptly_core::config::GeminiConfig;
use receiptly_gauth::{AuthError, TokenProvider};

pub mod wire;

use wire::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response contained no text")]
    EmptyResponse,
}

pub struct GeminiClient {
    http: reqwest::Client,
    tokens: Arc<TokenProvider>,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(
        config: &GeminiConfig,
        key: receiptly_gauth::ServiceAccountKey,
    ) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GeminiError::Client)?;
        let endpoint = format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/\
             {location}/publishers/google/models/{model}:generateContent",
            location = config.location,
            project = config.project_id,
            model = config.model,
        );

        Ok(Self {
            http,
            tokens: Arc::new(TokenProvider::new(key, CLOUD_PLATFORM_SCOPE)),
            endpoint,
        })
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig { temperature: TEMPERATURE },
        };

        let token = self.tokens.token().await?;
        debug!(endpoint = %self.endpoint, "calling generateContent");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Status { status: status.as_u16(), body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.first_text().ok_or(GeminiError::EmptyResponse)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.generate(vec![Part::Text { text: prompt.to_string() }]).await?)
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &ImageAttachment,
    ) -> anyhow::Result<String> {
        let parts = vec![
            Part::Text { text: prompt.to_string() },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            },
        ];
        Ok(self.generate(parts).await?)
    }
}
