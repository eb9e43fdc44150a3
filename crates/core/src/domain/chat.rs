use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answered general question. Written once, read back newest-first with a
/// bounded count to give the Q&A handler short-term memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(
        user_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            question: question.into(),
            answer: answer.into(),
            session_id,
            created_at: Utc::now(),
        }
    }
}
