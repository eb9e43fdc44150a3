//! Outbound lookups for the price-comparison handler: a Google Custom Search
//! client and an IP-based location resolver. Both degrade instead of failing;
//! the handler decides what to tell the user.

pub mod location;
pub mod prices;

pub use location::IpLocator;
pub use prices::CustomSearchClient;
