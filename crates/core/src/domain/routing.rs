use serde::{Deserialize, Serialize};

use crate::domain::pass::GroceryPassRequest;

/// The uniform contract the router returns to its caller regardless of which
/// handler ran. Serializes as `{"type": ..., "content": ...}` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum RoutedResponse {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "error")]
    Error(String),
    #[serde(rename = "PASS_BUILDER")]
    PassBuilder(GroceryPassRequest),
}

impl RoutedResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error(content.into())
    }
}
