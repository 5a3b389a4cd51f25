//! Page-number pagination: `?page=N&page_size=M`, answered with
//! `{count, next, previous, results}`.

use axum::http::Uri;
use serde::Serialize;
use url::form_urlencoded;
use utoipa::ToSchema;

use crate::config::ApiConfig;
use crate::error::ApiError;

const INVALID_PAGE: &str = "Invalid page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// A malformed `page` is a 404; a malformed `page_size` falls back to the default
    pub fn parse(page: Option<&str>, page_size: Option<&str>, api: &ApiConfig) -> Result<Self, ApiError> {
        let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
            None => 1,
            Some("last") => i64::MAX,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(ApiError::not_found(INVALID_PAGE)),
            },
        };

        let max = api.max_page_size.max(1) as i64;
        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(max))
            .unwrap_or_else(|| (api.page_size.max(1) as i64).min(max));

        Ok(Self { page, page_size })
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn page_count(&self, count: i64) -> i64 {
        ((count + self.page_size - 1) / self.page_size).max(1)
    }

    /// Resolves `last` and rejects pages past the end. Page 1 always exists.
    pub fn resolve(self, count: i64) -> Result<Self, ApiError> {
        let pages = self.page_count(count);
        match self.page {
            i64::MAX => Ok(Self { page: pages, ..self }),
            page if page > pages => Err(ApiError::not_found(INVALID_PAGE)),
            _ => Ok(self),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, count: i64, results: Vec<T>, uri: &Uri) -> Self {
        let pages = request.page_count(count);
        let next = (request.page < pages).then(|| page_link(uri, Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            2 => Some(page_link(uri, None)),
            page => Some(page_link(uri, Some(page - 1))),
        };
        Self { count, next, previous, results }
    }
}

/// Same path and query with `page` replaced, or removed for the first page
fn page_link(uri: &Uri, page: Option<i64>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        if key != "page" {
            query.append_pair(&key, &value);
        }
    }
    if let Some(page) = page {
        query.append_pair("page", &page.to_string());
    }

    let query = query.finish();
    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn api() -> ApiConfig {
        AppConfig::testing().api
    }

    #[test]
    fn defaults_and_caps_page_size() {
        let request = PageRequest::parse(None, None, &api()).unwrap();
        assert_eq!(request, PageRequest { page: 1, page_size: 20 });
        assert_eq!(request.offset(), 0);

        let request = PageRequest::parse(Some("3"), Some("500"), &api()).unwrap();
        assert_eq!(request.page_size, 100);
        assert_eq!(request.offset(), 200);

        let request = PageRequest::parse(None, Some("abc"), &api()).unwrap();
        assert_eq!(request.page_size, 20);
    }

    #[test]
    fn rejects_bad_and_out_of_range_pages() {
        for raw in ["0", "-1", "two"] {
            let err = PageRequest::parse(Some(raw), None, &api()).unwrap_err();
            assert_eq!(err.status_code(), 404);
            assert_eq!(err.message(), INVALID_PAGE);
        }

        let request = PageRequest::parse(Some("3"), Some("10"), &api()).unwrap();
        assert!(request.resolve(25).is_ok());
        assert!(request.resolve(20).is_err());

        let first = PageRequest::parse(Some("1"), None, &api()).unwrap();
        assert!(first.resolve(0).is_ok());

        let last = PageRequest::parse(Some("last"), Some("10"), &api()).unwrap();
        assert_eq!(last.resolve(25).unwrap().page, 3);
    }

    #[test]
    fn builds_next_and_previous_links() {
        let uri: Uri = "/api/v1/accounts/divisions/?search=hr&page=2&page_size=1".parse().unwrap();
        let request = PageRequest { page: 2, page_size: 1 };
        let page = Page::new(request, 3, vec![1], &uri);

        assert_eq!(page.next.as_deref(), Some("/api/v1/accounts/divisions/?search=hr&page_size=1&page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/v1/accounts/divisions/?search=hr&page_size=1"));

        let last = Page::new(PageRequest { page: 3, page_size: 1 }, 3, vec![1], &uri);
        assert!(last.next.is_none());
        assert_eq!(last.previous.as_deref(), Some("/api/v1/accounts/divisions/?search=hr&page_size=1&page=2"));
    }
}
