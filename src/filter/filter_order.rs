use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, TableSchema};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"col"`, `"-col"`, `"col desc"`, comma lists of those,
    /// arrays of strings, or `{ "col": "desc" }` objects.
    pub fn validate_and_parse(schema: &TableSchema, order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        match order {
            Value::Null => {}
            Value::String(s) => Self::parse_order_string(schema, s, &mut out)?,
            Value::Array(arr) => {
                for v in arr {
                    let s = v
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder(format!("Order entries must be strings: {}", v)))?;
                    Self::parse_order_string(schema, s, &mut out)?;
                }
            }
            Value::Object(obj) => {
                for (k, v) in obj {
                    let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                        "desc" => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(Self::info(schema, k, sort)?);
                }
            }
            other => return Err(FilterError::InvalidOrder(other.to_string())),
        }
        Ok(out)
    }

    fn parse_order_string(schema: &TableSchema, s: &str, out: &mut Vec<FilterOrderInfo>) -> Result<(), FilterError> {
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let Some(col) = it.next() else { continue };

            let (col, mut sort) = match col.strip_prefix('-') {
                Some(rest) => (rest, SortDirection::Desc),
                None => (col, SortDirection::Asc),
            };
            match it.next() {
                Some(dir) if dir.eq_ignore_ascii_case("desc") => sort = SortDirection::Desc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => {}
                Some(dir) => return Err(FilterError::InvalidOrder(format!("Unknown sort direction '{}'", dir))),
                None => {}
            }
            out.push(Self::info(schema, col, sort)?);
        }
        Ok(())
    }

    fn info(schema: &TableSchema, column: &str, sort: SortDirection) -> Result<FilterOrderInfo, FilterError> {
        let kind = schema
            .column(column)
            .ok_or_else(|| FilterError::InvalidColumn(format!("Cannot order {} by '{}'", schema.name, column)))?;
        Ok(FilterOrderInfo { column: column.to_string(), kind, sort })
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ColumnKind;
    use serde_json::json;

    const ITEMS: TableSchema = TableSchema {
        name: "items",
        columns: &[("level", ColumnKind::Int), ("code", ColumnKind::Text)],
    };

    #[test]
    fn parses_all_order_forms() {
        let infos = FilterOrder::validate_and_parse(&ITEMS, &json!("-level, code")).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"level\" DESC, \"code\" ASC");

        let infos = FilterOrder::validate_and_parse(&ITEMS, &json!(["level desc", "code"])).unwrap();
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].sort, SortDirection::Asc);

        let infos = FilterOrder::validate_and_parse(&ITEMS, &json!({"code": "desc"})).unwrap();
        assert_eq!(infos[0].column, "code");
        assert_eq!(infos[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_unknown_columns() {
        assert!(FilterOrder::validate_and_parse(&ITEMS, &json!("name")).is_err());
        assert!(FilterOrder::validate_and_parse(&ITEMS, &json!("code sideways")).is_err());
        assert!(FilterOrder::validate_and_parse(&ITEMS, &json!(42)).is_err());
    }
}
