pub mod chat;
pub mod pass;
pub mod price;
pub mod receipt;
pub mod routing;
