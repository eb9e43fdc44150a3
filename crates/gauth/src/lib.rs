//! Service-account authentication for Google APIs.
//!
//! Both the Vertex AI client and the Wallet client authenticate the same way:
//! load a service-account key from disk, mint a short-lived assertion signed
//! with its private key, and exchange it at the token endpoint for a bearer
//! token. [`TokenProvider`] does that exchange and caches the token until it
//! is close to expiry.

pub mod key;
pub mod token;

pub use key::ServiceAccountKey;
pub use token::{AuthError, TokenProvider};
