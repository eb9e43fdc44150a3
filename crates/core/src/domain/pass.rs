use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// A structured grocery list derived from free text by a model call.
/// Transient: it exists for the duration of one pass-creation request and is
/// only ever persisted inside the signed save-token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryPassRequest {
    /// The model is asked to emit this field but the caller's id always wins;
    /// deserialization tolerates its absence.
    #[serde(default)]
    pub user_id: String,
    pub items: Vec<PassItem>,
}
