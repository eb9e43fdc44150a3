use async_trait::async_trait;
use thiserror::Error;

use receiptly_core::domain::chat::ChatEntry;
use receiptly_core::domain::receipt::Receipt;

pub mod chat_history;
pub mod memory;
pub mod receipt;

pub use chat_history::SqlChatHistoryRepository;
pub use memory::{InMemoryChatHistoryRepository, InMemoryReceiptRepository};
pub use receipt::SqlReceiptRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn add(&self, receipt: &Receipt) -> Result<(), RepositoryError>;

    /// Every stored receipt, across all owners. The Q&A handler deliberately
    /// reads the store unscoped (see DESIGN.md); [`Self::for_user`] exists for
    /// callers that do want scoping.
    async fn all(&self) -> Result<Vec<Receipt>, RepositoryError>;

    async fn for_user(&self, user_id: &str) -> Result<Vec<Receipt>, RepositoryError>;
}

#[async_trait]
pub trait ChatHistoryRepository: Send + Sync {
    async fn append(&self, entry: &ChatEntry) -> Result<(), RepositoryError>;

    /// The `limit` most recent entries for one user, newest first.
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatEntry>, RepositoryError>;
}
