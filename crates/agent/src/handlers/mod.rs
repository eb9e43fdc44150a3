pub mod pass;
pub mod price;
pub mod receipts;
