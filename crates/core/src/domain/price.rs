use serde::{Deserialize, Serialize};

/// Approximate caller location used only to localize price-search queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            country: "United States".to_string(),
        }
    }
}

/// Outcome of one price-search call. Unavailability is a value, not a fault:
/// the price handler turns the reason into a user-facing message.
#[derive(Clone, Debug, PartialEq)]
pub enum PriceLookup {
    Available { results: serde_json::Value },
    Unavailable { reason: String },
}
