//! Seams between the agent and its external lookups. Concrete
//! implementations live in `receiptly-search`; tests script these traits
//! directly.

use async_trait::async_trait;

use receiptly_core::domain::price::{Location, PriceLookup};

/// One location-scoped web search for product prices. Unavailability (missing
/// credentials, HTTP or transport failure) is reported as a
/// [`PriceLookup::Unavailable`] value; implementations never raise.
#[async_trait]
pub trait PriceSearch: Send + Sync {
    async fn search(&self, query: &str, location: &Location) -> PriceLookup;
}

/// Resolves the caller's approximate location. Infallible by contract:
/// implementations fall back to [`Location::default`] on any failure.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self) -> Location;
}
