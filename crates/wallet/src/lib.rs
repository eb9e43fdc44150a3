//! Google Wallet pass issuance.
//!
//! A grocery pass is one `genericObject` referencing a per-issuer
//! `genericClass`, delivered as an RS256-signed save-to-wallet token. The
//! class is created lazily on first use; objects are minted fresh per
//! request with a uuid-suffixed id.

pub mod client;
pub mod pass;

pub use client::{WalletClient, WalletError};
