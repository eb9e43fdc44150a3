use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(pub String);

impl ReceiptId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A single extracted line on a receipt. Owned by its parent [`Receipt`];
/// there is no independent line-item identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// One processed receipt image. Persisted as a single document; never mutated
/// after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub purchase_date: NaiveDate,
    pub purchase_place: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        user_id: impl Into<String>,
        items: Vec<LineItem>,
        purchase_date: NaiveDate,
        purchase_place: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReceiptId::generate(),
            user_id: user_id.into(),
            items,
            purchase_date,
            purchase_place,
            uploaded_at: now,
            updated_at: now,
        }
    }
}
