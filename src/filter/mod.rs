//! Structured query descriptions (`FilterData`) shared by both stores:
//! compiled to parameterized SQL for Postgres, evaluated directly for the
//! in-memory store.

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod matcher;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::*;
