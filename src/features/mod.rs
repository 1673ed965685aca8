pub mod identity;
pub mod reports;
