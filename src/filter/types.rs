use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$and")] And,
    #[serde(rename = "$or")] Or,
    #[serde(rename = "$not")] Not,
}

impl FilterOp {
    pub fn parse(key: &str) -> Option<FilterOp> {
        Some(match key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$and" => FilterOp::And,
            "$or" => FilterOp::Or,
            "$not" => FilterOp::Not,
            _ => return None,
        })
    }

    pub fn is_logical(self) -> bool {
        matches!(self, FilterOp::And | FilterOp::Or | FilterOp::Not)
    }
}

/// Query description shared by every store backend: a JSON where-clause,
/// an order spec and optional paging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, where_clause: Value) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    pub fn with_order(mut self, order: impl Into<Value>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// AND an extra condition onto the existing where-clause
    pub fn and_where(mut self, condition: Value) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            None => condition,
            Some(Value::Object(existing)) if existing.is_empty() => condition,
            Some(existing) => serde_json::json!({ "$and": [existing, condition] }),
        });
        self
    }

    /// Same conditions without paging, for counts
    pub fn without_paging(&self) -> Self {
        Self {
            where_clause: self.where_clause.clone(),
            order: None,
            limit: None,
            offset: None,
        }
    }
}

/// Storage type of a column; drives parameter binding and in-memory comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
    Bool,
    Timestamp,
    Date,
    Json,
    TextArray,
}

/// Table name plus the columns a filter may reference
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|(c, _)| *c == name).map(|(_, kind)| *kind)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(c, _)| *c)
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub kind: ColumnKind,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub kind: ColumnKind,
    pub sort: SortDirection,
}

/// A bind parameter with the column type it targets
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub value: Value,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl ColumnKind {
    /// Check a filter operand against the column type, normalizing where needed
    /// (integers given as strings, dates given as timestamps and so on).
    pub fn coerce(self, column: &str, value: &Value) -> Result<Value, super::FilterError> {
        use chrono::{DateTime, NaiveDate, Utc};

        let invalid = || {
            super::FilterError::InvalidOperatorData(format!("Invalid value for column '{}': {}", column, value))
        };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ColumnKind::Int, Value::Number(n)) if n.is_i64() => Ok(value.clone()),
            (ColumnKind::Int, Value::String(s)) => s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
            (ColumnKind::Bool, Value::Bool(_)) => Ok(value.clone()),
            (ColumnKind::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            (ColumnKind::Text, Value::String(_)) => Ok(value.clone()),
            (ColumnKind::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ColumnKind::Timestamp, Value::String(s)) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(Value::String(dt.with_timezone(&Utc).to_rfc3339()));
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| Value::String(naive.and_utc().to_rfc3339()))
                    .ok_or_else(invalid)
            }
            (ColumnKind::Date, Value::String(s)) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return Ok(Value::String(d.to_string()));
                }
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| Value::String(dt.date_naive().to_string()))
                    .map_err(|_| invalid())
            }
            (ColumnKind::Json, _) => Ok(value.clone()),
            _ => Err(invalid()),
        }
    }
}
