use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult, TableSchema};

/// SQL generator for one table, driven by [`FilterData`].
pub struct Filter {
    schema: TableSchema,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn assign(&mut self, data: &FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = &data.where_clause {
            self.where_clause(where_clause.clone())?;
        }
        if let Some(order) = &data.order {
            self.order(order)?;
        }
        if data.limit.is_some() || data.offset.is_some() {
            self.limit(data.limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: &Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&self.schema, order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit.filter(|l| *l < 0) {
            return Err(FilterError::InvalidLimit(l.to_string()));
        }
        if let Some(o) = offset.filter(|o| *o < 0) {
            return Err(FilterError::InvalidOffset(o.to_string()));
        }
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT * FROM \"{}\"", self.schema.name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        tracing::debug!(table = self.schema.name, %query, "built select");
        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        match &self.where_data {
            Some(where_data) => {
                let (sql, params) = FilterWhere::generate(&self.schema, where_data)?;
                Ok(SqlResult { query: sql.unwrap_or_default(), params })
            }
            None => Ok(SqlResult { query: String::new(), params: vec![] }),
        }
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.schema.name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.schema.name, where_result.query)
        };
        tracing::debug!(table = self.schema.name, %query, "built count");
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ColumnKind;
    use serde_json::json;

    const DIVS: TableSchema = TableSchema {
        name: "divisions",
        columns: &[
            ("id", ColumnKind::Int),
            ("code", ColumnKind::Text),
            ("level", ColumnKind::Int),
            ("is_active", ColumnKind::Bool),
        ],
    };

    #[test]
    fn select_with_where_order_and_paging() {
        let data = FilterData::new()
            .with_where(json!({"is_active": true, "level": {"$lte": 2}}))
            .with_order(json!("level, -code"))
            .paginate(20, 40);

        let mut filter = Filter::new(DIVS);
        filter.assign(&data).unwrap();
        let sql = filter.to_sql().unwrap();

        assert_eq!(
            sql.query,
            "SELECT * FROM \"divisions\" WHERE \"is_active\" = $1 AND \"level\" <= $2 ORDER BY \"level\" ASC, \"code\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn count_ignores_order_and_paging() {
        let data = FilterData::new().with_where(json!({"code": "IT"})).with_order(json!("code")).paginate(5, 0);
        let mut filter = Filter::new(DIVS);
        filter.assign(&data).unwrap();

        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"divisions\" WHERE \"code\" = $1");
    }

    #[test]
    fn unfiltered_select() {
        let filter = Filter::new(DIVS);
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"divisions\"");
    }

    #[test]
    fn rejects_negative_paging() {
        let mut filter = Filter::new(DIVS);
        assert!(filter.limit(Some(-1), None).is_err());
        assert!(filter.limit(Some(1), Some(-1)).is_err());
    }
}
