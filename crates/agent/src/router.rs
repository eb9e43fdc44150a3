use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument};

use receiptly_core::domain::routing::RoutedResponse;
use receiptly_db::repositories::{ChatHistoryRepository, ReceiptRepository};

use crate::handlers::pass::{PassBuilder, PassDraft};
use crate::handlers::price::PriceComparison;
use crate::handlers::receipts::ReceiptQa;
use crate::intent::Intent;
use crate::llm::LlmClient;
use crate::prompts;
use crate::tools::{LocationResolver, PriceSearch};

/// Classifies each inbound question and dispatches it to exactly one handler.
///
/// The router owns its handlers and is cheap to share behind an `Arc`; all
/// collaborators arrive through the constructor so tests can script every
/// seam.
pub struct AgentRouter {
    llm: Arc<dyn LlmClient>,
    price: PriceComparison,
    pass: PassBuilder,
    qa: ReceiptQa,
}

impl AgentRouter {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        receipts: Arc<dyn ReceiptRepository>,
        chat_history: Arc<dyn ChatHistoryRepository>,
        search: Arc<dyn PriceSearch>,
        locator: Arc<dyn LocationResolver>,
    ) -> Self {
        Self {
            llm: llm.clone(),
            price: PriceComparison::new(llm.clone(), search, locator),
            pass: PassBuilder::new(llm.clone()),
            qa: ReceiptQa::new(llm, receipts, chat_history),
        }
    }

    #[instrument(skip(self, question, session_id), fields(user_id = %user_id))]
    pub async fn answer_question(
        &self,
        user_id: &str,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<RoutedResponse> {
        if user_id.is_empty() {
            return Ok(RoutedResponse::error("User ID is required."));
        }

        let reply = self.llm.complete(&prompts::intent(question)).await?;
        let intent = Intent::classify(&reply);
        info!(intent = intent.as_str(), "routed question");

        match intent {
            Intent::PriceComparison => self.price.answer(question).await,
            Intent::CreatePass => match self.pass.draft(question, user_id).await? {
                PassDraft::Ready(request) => Ok(RoutedResponse::PassBuilder(request)),
                PassDraft::Unparsable { error, .. } => Ok(RoutedResponse::error(format!(
                    "Sorry, failed to create grocery pass: {error}"
                ))),
            },
            Intent::GeneralQuestion => {
                let answer = self.qa.answer(user_id, question, session_id).await?;
                Ok(RoutedResponse::text(answer))
            }
        }
    }
}
