use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

use receiptly_core::domain::receipt::{LineItem, Receipt, ReceiptId};

use super::{ReceiptRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlReceiptRepository {
    pool: DbPool,
}

impl SqlReceiptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReceiptRepository for SqlReceiptRepository {
    async fn add(&self, receipt: &Receipt) -> Result<(), RepositoryError> {
        let items = serde_json::to_string(&receipt.items)
            .map_err(|err| RepositoryError::Decode(format!("encode line items: {err}")))?;

        sqlx::query(
            "INSERT INTO receipt (id, user_id, items, purchase_date, purchase_place, uploaded_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&receipt.id.0)
        .bind(&receipt.user_id)
        .bind(items)
        .bind(receipt.purchase_date.format(DATE_FORMAT).to_string())
        .bind(&receipt.purchase_place)
        .bind(receipt.uploaded_at.to_rfc3339())
        .bind(receipt.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all(&self) -> Result<Vec<Receipt>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, items, purchase_date, purchase_place, uploaded_at, updated_at
             FROM receipt ORDER BY uploaded_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_receipt).collect()
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Receipt>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, items, purchase_date, purchase_place, uploaded_at, updated_at
             FROM receipt WHERE user_id = ? ORDER BY uploaded_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_receipt).collect()
    }
}

fn decode_receipt(row: &sqlx::sqlite::SqliteRow) -> Result<Receipt, RepositoryError> {
    let items_raw: String = row.try_get("items")?;
    let items: Vec<LineItem> = serde_json::from_str(&items_raw)
        .map_err(|err| RepositoryError::Decode(format!("decode line items: {err}")))?;

    let purchase_date_raw: String = row.try_get("purchase_date")?;
    let purchase_date = NaiveDate::parse_from_str(&purchase_date_raw, DATE_FORMAT)
        .map_err(|err| RepositoryError::Decode(format!("decode purchase_date: {err}")))?;

    Ok(Receipt {
        id: ReceiptId(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        items,
        purchase_date,
        purchase_place: row.try_get("purchase_place")?,
        uploaded_at: decode_timestamp(row, "uploaded_at")?,
        updated_at: decode_timestamp(row, "updated_at")?,
    })
}

fn decode_timestamp(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| RepositoryError::Decode(format!("decode {column}: {err}")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use receiptly_core::domain::receipt::{LineItem, Receipt};

    use super::SqlReceiptRepository;
    use crate::migrations::run_pending;
    use crate::repositories::ReceiptRepository;
    use crate::connect_with_settings;

    fn receipt_fixture(user_id: &str) -> Receipt {
        Receipt::new(
            user_id,
            vec![
                LineItem { name: "Milk".to_string(), price: Some(Decimal::new(250, 2)), quantity: 1 },
                LineItem { name: "Bread".to_string(), price: None, quantity: 2 },
            ],
            NaiveDate::from_ymd_opt(2025, 7, 27).expect("valid date"),
            Some("SuperMart".to_string()),
        )
    }

    #[tokio::test]
    async fn add_then_read_back_round_trip() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        let repo = SqlReceiptRepository::new(pool);

        let receipt = receipt_fixture("user-1");
        repo.add(&receipt).await.expect("add receipt");

        let stored = repo.all().await.expect("read receipts");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, receipt.id);
        assert_eq!(stored[0].items, receipt.items);
        assert_eq!(stored[0].purchase_place.as_deref(), Some("SuperMart"));
    }

    #[tokio::test]
    async fn all_returns_receipts_for_every_owner() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        let repo = SqlReceiptRepository::new(pool);

        repo.add(&receipt_fixture("user-1")).await.expect("add first");
        repo.add(&receipt_fixture("user-2")).await.expect("add second");

        let unscoped = repo.all().await.expect("read all");
        assert_eq!(unscoped.len(), 2);

        let scoped = repo.for_user("user-1").await.expect("read scoped");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].user_id, "user-1");
    }
}
