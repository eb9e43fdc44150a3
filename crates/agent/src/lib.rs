//! Conversational routing for receiptly.
//!
//! A single inbound question takes one path through this crate:
//! 1. **Intent classification** (`intent`): one model call, pattern-matched
//!    into a three-way [`intent::Intent`].
//! 2. **Dispatch** (`router`): exactly one handler runs per request.
//! 3. **Handlers** (`handlers`): price comparison, grocery-pass drafting, and
//!    receipt Q&A; receipt-image extraction lives here too since it shares the
//!    model client and the receipt store.
//!
//! The model is only ever a translator and summarizer. Every reply that must
//! be machine-readable is fence-stripped and parsed; parse failures are
//! values (`PassDraft::Unparsable`) or faults, never silently repaired.

pub mod handlers;
pub mod intent;
pub mod llm;
pub mod prompts;
pub mod router;
pub mod tools;

pub use handlers::pass::PassDraft;
pub use handlers::receipts::ReceiptPipeline;
pub use llm::{ImageAttachment, LlmClient};
pub use router::AgentRouter;
