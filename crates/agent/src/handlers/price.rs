use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use receiptly_core::domain::price::PriceLookup;
use receiptly_core::domain::routing::RoutedResponse;

use crate::llm::LlmClient;
use crate::prompts;
use crate::tools::{LocationResolver, PriceSearch};

/// Answers price questions by chaining product extraction, a located web
/// search, and one synthesis call over the raw search results.
pub struct PriceComparison {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn PriceSearch>,
    locator: Arc<dyn LocationResolver>,
}

impl PriceComparison {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn PriceSearch>,
        locator: Arc<dyn LocationResolver>,
    ) -> Self {
        Self { llm, search, locator }
    }

    pub async fn answer(&self, question: &str) -> Result<RoutedResponse> {
        let extracted = self.llm.complete(&prompts::product_extraction(question)).await?;
        let product_query = extracted.trim().replace('"', "");
        if product_query.is_empty() {
            return Ok(RoutedResponse::text(
                "I'm sorry, I couldn't understand which product you're asking about. \
                 Please be more specific.",
            ));
        }
        debug!(product = %product_query, "extracted product query");

        let location = self.locator.resolve().await;
        let results = match self.search.search(&product_query, &location).await {
            PriceLookup::Available { results } => results,
            PriceLookup::Unavailable { reason } => {
                info!(%reason, "price search unavailable");
                return Ok(RoutedResponse::text(format!(
                    "I couldn't search for prices right now. Reason: {reason}"
                )));
            }
        };

        if results.get("items").is_none() {
            return Ok(RoutedResponse::text(format!(
                "I couldn't find any specific online listings for '{product_query}'. \
                 You could try a broader search term."
            )));
        }

        let summary = self
            .llm
            .complete(&prompts::price_synthesis(question, &results.to_string()))
            .await?;
        Ok(RoutedResponse::text(summary))
    }
}
