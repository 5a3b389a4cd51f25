use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{ColumnKind, FilterOp, FilterWhereInfo, SqlParam, TableSchema};

/// Builds a parameterized SQL predicate from a JSON where-clause.
///
/// Parameters are numbered across the whole tree, so nested `$and`/`$or`/`$not`
/// clauses share one `$n` sequence.
pub struct FilterWhere<'a> {
    schema: &'a TableSchema,
    params: Vec<SqlParam>,
}

impl<'a> FilterWhere<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema, params: vec![] }
    }

    /// Returns `None` when the clause places no constraint on the rows
    pub fn generate(schema: &TableSchema, where_data: &Value) -> Result<(Option<String>, Vec<SqlParam>), FilterError> {
        let mut filter_where = FilterWhere::new(schema);
        let sql = filter_where.build_node(where_data)?;
        Ok((sql, filter_where.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    /// Flatten one object level into column conditions, checking columns and operands.
    /// Logical operators are left to the caller.
    pub fn parse_conditions(schema: &TableSchema, obj: &Map<String, Value>) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let mut out = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                continue;
            }
            let kind = schema
                .column(key)
                .ok_or_else(|| FilterError::InvalidColumn(format!("Unknown column '{}' on {}", key, schema.name)))?;

            match value {
                Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                    for (op_key, op_val) in ops {
                        let operator = FilterOp::parse(op_key)
                            .filter(|op| !op.is_logical())
                            .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                        out.push(Self::checked(key, kind, operator, op_val)?);
                    }
                }
                // Implicit equality: { field: value }
                _ => out.push(Self::checked(key, kind, FilterOp::Eq, value)?),
            }
        }
        Ok(out)
    }

    fn checked(column: &str, kind: ColumnKind, operator: FilterOp, data: &Value) -> Result<FilterWhereInfo, FilterError> {
        let data = match operator {
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{:?} on '{}' requires an array", operator, column)))?;
                Value::Array(values.iter().map(|v| kind.coerce(column, v)).collect::<Result<_, _>>()?)
            }
            FilterOp::Like | FilterOp::ILike => {
                if !data.is_string() || kind != ColumnKind::Text {
                    return Err(FilterError::InvalidOperatorData(format!("Pattern match on '{}' requires a text column and string pattern", column)));
                }
                data.clone()
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte if data.is_null() => {
                return Err(FilterError::InvalidOperatorData(format!("Comparison on '{}' requires a value", column)));
            }
            _ => kind.coerce(column, data)?,
        };

        Ok(FilterWhereInfo { column: column.to_string(), kind, operator, data })
    }

    fn build_node(&mut self, where_data: &Value) -> Result<Option<String>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(None),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if let Some(rest) = key.strip_prefix('$') {
                let op = FilterOp::parse(key)
                    .filter(|op| op.is_logical())
                    .ok_or_else(|| FilterError::UnsupportedOperator(format!("${}", rest)))?;
                if let Some(sql) = self.build_logical(op, value)? {
                    parts.push(sql);
                }
            }
        }

        for condition in Self::parse_conditions(self.schema, obj)? {
            if let Some(sql) = self.build_sql_condition(&condition) {
                parts.push(sql);
            }
        }

        Ok(if parts.is_empty() { None } else { Some(parts.join(" AND ")) })
    }

    fn build_logical(&mut self, op: FilterOp, value: &Value) -> Result<Option<String>, FilterError> {
        match op {
            FilterOp::And | FilterOp::Or => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{:?} requires array", op)))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    // Wrap subclause
                    match self.build_node(v)? {
                        Some(sql) => sql_parts.push(format!("({})", sql)),
                        // An unconstrained branch makes the whole OR true
                        None if op == FilterOp::Or => return Ok(None),
                        None => {}
                    }
                }
                if sql_parts.is_empty() {
                    return Ok(if op == FilterOp::Or { Some("1=0".to_string()) } else { None });
                }
                let joiner = if op == FilterOp::And { " AND " } else { " OR " };
                Ok(Some(format!("({})", sql_parts.join(joiner))))
            }
            FilterOp::Not => Ok(Some(match self.build_node(value)? {
                Some(sql) => format!("NOT ({})", sql),
                None => "1=0".to_string(),
            })),
            other => Err(FilterError::UnsupportedOperator(format!("{:?}", other))),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Option<String> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        let kind = condition.kind;

        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Some(format!("{} IS NULL", quoted_column)) }
                else { Some(format!("{} = {}", quoted_column, self.param(kind, data))) }
            }
            FilterOp::Ne => {
                if data.is_null() { Some(format!("{} IS NOT NULL", quoted_column)) }
                else { Some(format!("{} <> {}", quoted_column, self.param(kind, data))) }
            }
            FilterOp::Gt => Some(format!("{} > {}", quoted_column, self.param(kind, data))),
            FilterOp::Gte => Some(format!("{} >= {}", quoted_column, self.param(kind, data))),
            FilterOp::Lt => Some(format!("{} < {}", quoted_column, self.param(kind, data))),
            FilterOp::Lte => Some(format!("{} <= {}", quoted_column, self.param(kind, data))),
            FilterOp::Like => Some(format!("{} LIKE {}", quoted_column, self.param(kind, data))),
            FilterOp::ILike => Some(format!("{} ILIKE {}", quoted_column, self.param(kind, data))),
            FilterOp::In | FilterOp::NIn => {
                let values = data.as_array().cloned().unwrap_or_default();
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return if negate { None } else { Some("1=0".to_string()) };
                }
                let params: Vec<String> = values.iter().map(|v| self.param(kind, v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Some(format!("{} {} ({})", quoted_column, keyword, params.join(", ")))
            }
            FilterOp::And | FilterOp::Or | FilterOp::Not => None,
        }
    }

    fn param(&mut self, kind: ColumnKind, value: &Value) -> String {
        self.params.push(SqlParam { value: value.clone(), kind });
        format!("${}", self.params.len())
    }
}
