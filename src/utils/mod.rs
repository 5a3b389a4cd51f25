pub mod datetime;
pub mod formatting;
