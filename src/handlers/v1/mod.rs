pub mod auth;
pub mod divisions;
pub mod profile;
