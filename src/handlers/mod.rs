// handlers/mod.rs - HTTP handlers grouped by API version
//
// v1: authentication, own profile and the division hierarchy
// v2: read-only user directory
// docs: OpenAPI documents and their viewers (public)

pub mod docs;
pub mod v1;
pub mod v2;

use std::future::Future;

use crate::api::PageRequest;
use crate::error::ApiError;

/// Runs a paginated fetch, resolving `page=last` and rejecting pages past
/// the end. The count is only known after the first fetch, so a `last`
/// request costs a second round trip.
pub async fn paginate<T, E, F, Fut>(request: PageRequest, fetch: F) -> Result<(PageRequest, i64, Vec<T>), ApiError>
where
    F: Fn(i64, i64) -> Fut,
    Fut: Future<Output = Result<(i64, Vec<T>), E>>,
    ApiError: From<E>,
{
    let (count, rows) = fetch(request.limit(), request.offset()).await?;
    let resolved = request.resolve(count)?;
    if resolved == request {
        return Ok((request, count, rows));
    }

    let (count, rows) = fetch(resolved.limit(), resolved.offset()).await?;
    Ok((resolved, count, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn numbers(total: i64, limit: i64, offset: i64) -> Result<(i64, Vec<i64>), ApiError> {
        Ok((total, (offset..total).take(limit as usize).collect()))
    }

    #[tokio::test]
    async fn last_page_is_refetched() {
        let request = PageRequest { page: i64::MAX, page_size: 2 };
        let (request, count, rows) = paginate(request, |limit, offset| numbers(5, limit, offset)).await.unwrap();
        assert_eq!(request.page, 3);
        assert_eq!(count, 5);
        assert_eq!(rows, vec![4]);
    }

    #[tokio::test]
    async fn page_past_the_end_is_404() {
        let request = PageRequest { page: 4, page_size: 2 };
        let err = paginate(request, |limit, offset| numbers(5, limit, offset)).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
