pub mod clean;
pub mod config;
pub mod domain;

pub use clean::strip_markdown_fences;
pub use domain::chat::ChatEntry;
pub use domain::pass::{GroceryPassRequest, PassItem};
pub use domain::price::{Location, PriceLookup};
pub use domain::receipt::{LineItem, Receipt, ReceiptId};
pub use domain::routing::RoutedResponse;
