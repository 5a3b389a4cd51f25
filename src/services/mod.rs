pub mod account_service;
pub mod division_service;
pub mod hierarchy;
pub mod token_service;
pub mod user_service;

pub use account_service::{AccountError, AccountService};
pub use division_service::{DivisionError, DivisionService};
pub use hierarchy::DivisionTree;
pub use token_service::{TokenPair, TokenService};
pub use user_service::UserService;

/// `term` with LIKE wildcards escaped, for exact case-insensitive matches
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive "contains" pattern
pub(crate) fn search_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}
