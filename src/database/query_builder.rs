use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{ColumnKind, Filter, FilterData, SqlParam, SqlResult, TableSchema};

pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(schema: TableSchema) -> Self {
        Self {
            filter: Filter::new(schema),
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn filter(mut self, filter_data: &FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result: SqlResult = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

// Typed values for one parameter; NULLs still carry the column type
enum Bound {
    Int(Option<i64>),
    Text(Option<String>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
    Json(Option<serde_json::Value>),
    TextArray(Option<Vec<String>>),
}

fn typed(p: &SqlParam) -> Bound {
    let v = &p.value;
    match p.kind {
        ColumnKind::Int => Bound::Int(v.as_i64()),
        ColumnKind::Text => Bound::Text(v.as_str().map(str::to_string)),
        ColumnKind::Bool => Bound::Bool(v.as_bool()),
        ColumnKind::Timestamp => Bound::Timestamp(
            v.as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        ),
        ColumnKind::Date => Bound::Date(v.as_str().and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())),
        ColumnKind::Json => Bound::Json((!v.is_null()).then(|| v.clone())),
        ColumnKind::TextArray => Bound::TextArray(None),
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match typed(p) {
        Bound::Int(v) => q.bind(v),
        Bound::Text(v) => q.bind(v),
        Bound::Bool(v) => q.bind(v),
        Bound::Timestamp(v) => q.bind(v),
        Bound::Date(v) => q.bind(v),
        Bound::Json(v) => q.bind(v.map(sqlx::types::Json)),
        Bound::TextArray(v) => q.bind(v),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match typed(p) {
        Bound::Int(v) => q.bind(v),
        Bound::Text(v) => q.bind(v),
        Bound::Bool(v) => q.bind(v),
        Bound::Timestamp(v) => q.bind(v),
        Bound::Date(v) => q.bind(v),
        Bound::Json(v) => q.bind(v.map(sqlx::types::Json)),
        Bound::TextArray(v) => q.bind(v),
    }
}
