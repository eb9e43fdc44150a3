use tokio::sync::RwLock;

use receiptly_core::domain::chat::ChatEntry;
use receiptly_core::domain::receipt::Receipt;

use super::{ChatHistoryRepository, ReceiptRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryReceiptRepository {
    receipts: RwLock<Vec<Receipt>>,
}

#[async_trait::async_trait]
impl ReceiptRepository for InMemoryReceiptRepository {
    async fn add(&self, receipt: &Receipt) -> Result<(), RepositoryError> {
        let mut receipts = self.receipts.write().await;
        receipts.push(receipt.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Receipt>, RepositoryError> {
        let receipts = self.receipts.read().await;
        Ok(receipts.clone())
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Receipt>, RepositoryError> {
        let receipts = self.receipts.read().await;
        Ok(receipts.iter().filter(|receipt| receipt.user_id == user_id).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryChatHistoryRepository {
    entries: RwLock<Vec<ChatEntry>>,
}

#[async_trait::async_trait]
impl ChatHistoryRepository for InMemoryChatHistoryRepository {
    async fn append(&self, entry: &ChatEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry.clone());
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<ChatEntry> =
            entries.iter().filter(|entry| entry.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
