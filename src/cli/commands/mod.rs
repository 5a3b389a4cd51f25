pub mod division;
pub mod migrate;
pub mod schema;
pub mod token;
pub mod user;
