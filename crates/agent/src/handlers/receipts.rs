use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use receiptly_core::clean::strip_markdown_fences;
use receiptly_core::domain::chat::ChatEntry;
use receiptly_core::domain::receipt::{LineItem, Receipt, ReceiptId};
use receiptly_db::repositories::{ChatHistoryRepository, ReceiptRepository};

use crate::llm::{ImageAttachment, LlmClient};
use crate::prompts;

/// How many prior exchanges are replayed into the Q&A context.
const CHAT_MEMORY_WINDOW: u32 = 10;

/// The JSON shape the extraction prompt asks the model for.
#[derive(Debug, Deserialize)]
struct ExtractedReceipt {
    #[serde(default)]
    items: Vec<LineItem>,
    purchase_date: Option<String>,
    purchase_place: Option<String>,
}

/// Extracts structured receipts from uploaded images and persists them.
pub struct ReceiptPipeline {
    llm: Arc<dyn LlmClient>,
    receipts: Arc<dyn ReceiptRepository>,
}

impl ReceiptPipeline {
    pub fn new(llm: Arc<dyn LlmClient>, receipts: Arc<dyn ReceiptRepository>) -> Self {
        Self { llm, receipts }
    }

    /// One multimodal model call, fence-strip, parse, persist. Returns the id
    /// of the stored receipt.
    pub async fn ingest(&self, image_data_uri: &str, user_id: &str) -> Result<ReceiptId> {
        let attachment = ImageAttachment::from_data_uri(image_data_uri)?;
        let today = Utc::now().date_naive();

        let reply = self
            .llm
            .complete_with_image(&prompts::receipt_extraction(today), &attachment)
            .await?;
        let cleaned = strip_markdown_fences(&reply);
        let extracted: ExtractedReceipt = serde_json::from_str(&cleaned)
            .context("receipt extraction reply was not valid JSON")?;

        let purchase_date = match extracted.purchase_date.as_deref() {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|_| {
                warn!(raw, "unparsable purchase date, falling back to today");
                today
            }),
            None => today,
        };

        let receipt = Receipt::new(
            user_id.to_string(),
            extracted.items,
            purchase_date,
            extracted.purchase_place,
        );
        self.receipts.add(&receipt).await?;
        info!(receipt_id = %receipt.id.0, item_count = receipt.items.len(), "stored receipt");

        Ok(receipt.id)
    }
}

/// Answers questions over the stored receipts, with a bounded window of the
/// user's recent exchanges replayed as conversational memory.
pub struct ReceiptQa {
    llm: Arc<dyn LlmClient>,
    receipts: Arc<dyn ReceiptRepository>,
    chat_history: Arc<dyn ChatHistoryRepository>,
}

impl ReceiptQa {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        receipts: Arc<dyn ReceiptRepository>,
        chat_history: Arc<dyn ChatHistoryRepository>,
    ) -> Self {
        Self { llm, receipts, chat_history }
    }

    pub async fn answer(
        &self,
        user_id: &str,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<String> {
        // Context is built from the unscoped store; see DESIGN.md.
        let receipts = self.receipts.all().await?;
        if receipts.is_empty() {
            return Ok("No receipt data found. Please upload a receipt image first.".to_string());
        }

        let history =
            self.chat_history.recent_for_user(user_id, CHAT_MEMORY_WINDOW).await?;
        let context = json!({
            "receipts": receipts,
            "chat_history": history
                .iter()
                .map(|entry| json!({"question": entry.question, "answer": entry.answer}))
                .collect::<Vec<_>>(),
        });

        let answer = self
            .llm
            .complete(&prompts::receipt_qa(&context.to_string(), question))
            .await?;

        let entry = ChatEntry::new(
            user_id.to_string(),
            question.to_string(),
            answer.clone(),
            session_id.map(|s| s.to_string()),
        );
        self.chat_history.append(&entry).await?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Datelike, Utc};
    use rust_decimal::Decimal;

    use receiptly_core::domain::receipt::{LineItem, Receipt};
    use receiptly_db::repositories::{
        ChatHistoryRepository, InMemoryChatHistoryRepository, InMemoryReceiptRepository,
        ReceiptRepository,
    };

    use crate::llm::{ImageAttachment, LlmClient};

    use super::{ReceiptPipeline, ReceiptQa};

    const PIXEL_URI: &str = "data:image/png;base64,aGVsbG8=";

    struct ScriptedLlm {
        replies: Mutex<Vec<String>>,
        prompts_seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                prompts_seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts_seen.lock().unwrap().push(prompt.to_string());
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

    #[tokio::test]
    async fn ingest_parses_a_fenced_reply_and_persists() {
        let reply = "```json\n{\"items\": [{\"name\": \"Milk\", \"price\": 2.50}], \
                     \"purchase_date\": \"2025-07-27\", \"purchase_place\": \"SuperMart\"}\n```";
        let store = Arc::new(InMemoryReceiptRepository::default());
        let pipeline = ReceiptPipeline::new(ScriptedLlm::new(&[reply]), store.clone());

        let id = pipeline.ingest(PIXEL_URI, "user-1").await.expect("should ingest");

        let stored = store.all().await.expect("should list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].user_id, "user-1");
        assert_eq!(stored[0].items[0].name, "Milk");
        assert_eq!(stored[0].items[0].price, Some(Decimal::new(250, 2)));
        assert_eq!(stored[0].items[0].quantity, 1);
        assert_eq!(stored[0].purchase_place.as_deref(), Some("SuperMart"));
        assert_eq!(stored[0].purchase_date.year(), 2025);
    }

    #[tokio::test]
    async fn ingest_falls_back_to_today_when_the_date_is_missing() {
        let reply = r#"{"items": [{"name": "Bread"}], "purchase_place": "Bakery"}"#;
        let store = Arc::new(InMemoryReceiptRepository::default());
        let pipeline = ReceiptPipeline::new(ScriptedLlm::new(&[reply]), store.clone());

        pipeline.ingest(PIXEL_URI, "user-1").await.expect("should ingest");

        let stored = store.all().await.expect("should list");
        assert_eq!(stored[0].purchase_date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn ingest_rejects_a_non_json_reply() {
        let store = Arc::new(InMemoryReceiptRepository::default());
        let pipeline =
            ReceiptPipeline::new(ScriptedLlm::new(&["I see a receipt for milk."]), store);

        assert!(pipeline.ingest(PIXEL_URI, "user-1").await.is_err());
    }

    #[tokio::test]
    async fn qa_without_receipts_asks_for_an_upload() {
        let qa = ReceiptQa::new(
            ScriptedLlm::new(&[]),
            Arc::new(InMemoryReceiptRepository::default()),
            Arc::new(InMemoryChatHistoryRepository::default()),
        );

        let answer = qa.answer("user-1", "what did I buy?", None).await.expect("should answer");
        assert_eq!(answer, "No receipt data found. Please upload a receipt image first.");
    }

    #[tokio::test]
    async fn qa_builds_context_and_records_the_exchange() {
        let receipts = Arc::new(InMemoryReceiptRepository::default());
        receipts
            .add(&Receipt::new(
                "user-1".to_string(),
                vec![LineItem {
                    name: "Milk".to_string(),
                    price: Some(Decimal::new(250, 2)),
                    quantity: 1,
                }],
                Utc::now().date_naive(),
                Some("SuperMart".to_string()),
            ))
            .await
            .expect("should add");
        let history = Arc::new(InMemoryChatHistoryRepository::default());
        let llm = ScriptedLlm::new(&["You bought milk."]);
        let qa = ReceiptQa::new(llm.clone(), receipts, history.clone());

        let answer = qa
            .answer("user-1", "what did I buy?", Some("session-9"))
            .await
            .expect("should answer");

        assert_eq!(answer, "You bought milk.");
        let prompt = llm.prompts_seen.lock().unwrap().join("\n");
        assert!(prompt.contains("Milk"));

        let recorded = history.recent_for_user("user-1", 10).await.expect("should list");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].answer, "You bought milk.");
        assert_eq!(recorded[0].session_id.as_deref(), Some("session-9"));
    }
}
