use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterData, TableSchema};

/// Filter-driven reads over one table
pub struct Repository<T> {
    schema: TableSchema,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(schema: TableSchema, pool: PgPool) -> Self {
        Self {
            schema,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: &FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.schema)
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: &FilterData) -> Result<Option<T>, DatabaseError> {
        let mut filter_data = filter_data.clone();
        filter_data.limit = Some(1);
        QueryBuilder::<T>::new(self.schema)
            .filter(&filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_404(&self, filter_data: &FilterData) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No matching row in {}", self.schema.name)))
    }

    pub async fn count(&self, filter_data: &FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(self.schema)
            .filter(&filter_data.without_paging())?
            .count(&self.pool)
            .await
    }

    pub async fn select_ids(&self, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = FilterData::new().with_where(json!({ "id": { "$in": ids } }));
        self.select_any(&filter).await
    }
}
