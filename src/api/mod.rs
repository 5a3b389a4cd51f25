//! Wire types of the versioned REST API.
//!
//! Everything under `v1` and `v2` is plain request/response data; the
//! handlers translate between these shapes and the services.

pub mod openapi;
pub mod pagination;
pub mod v1;
pub mod v2;

use serde::{Deserialize, Deserializer};

pub use pagination::{Page, PageRequest};

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `"true"`/`"1"` and `"false"`/`"0"`, anything else is ignored
pub fn parse_bool_param(raw: Option<&str>) -> Option<bool> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") => Some(true),
        Some("false") | Some("0") | Some("no") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_params() {
        assert_eq!(parse_bool_param(Some("True")), Some(true));
        assert_eq!(parse_bool_param(Some("0")), Some(false));
        assert_eq!(parse_bool_param(Some("maybe")), None);
        assert_eq!(parse_bool_param(None), None);
    }
}
