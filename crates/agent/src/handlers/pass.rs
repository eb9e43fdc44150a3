use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use receiptly_core::clean::strip_markdown_fences;
use receiptly_core::domain::pass::GroceryPassRequest;

use crate::llm::LlmClient;
use crate::prompts;

/// Outcome of asking the model to structure a grocery list. An unparsable
/// reply is a value, not a fault: the caller decides whether to retry, show
/// the raw text, or report an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassDraft {
    Ready(GroceryPassRequest),
    Unparsable {
        error: String,
        /// The model's reply exactly as received, fences and all.
        raw_response: String,
    },
}

/// Turns free-text grocery requests into a [`GroceryPassRequest`] via one
/// model call.
pub struct PassBuilder {
    llm: Arc<dyn LlmClient>,
}

impl PassBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn draft(&self, grocery_list: &str, user_id: &str) -> Result<PassDraft> {
        let reply = self.llm.complete(&prompts::pass_format(grocery_list)).await?;
        let cleaned = strip_markdown_fences(&reply);

        match serde_json::from_str::<GroceryPassRequest>(&cleaned) {
            Ok(mut request) => {
                // The caller's identity always wins over whatever the model
                // put in the JSON.
                request.user_id = user_id.to_string();
                Ok(PassDraft::Ready(request))
            }
            Err(err) => {
                warn!(error = %err, "grocery pass reply did not parse");
                Ok(PassDraft::Unparsable {
                    error: "Failed to parse grocery pass from LLM response.".to_string(),
                    raw_response: reply,
                })
            }
        }
    }
}
