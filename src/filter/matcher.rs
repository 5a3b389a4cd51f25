//! Evaluates [`FilterData`] against rows in memory.
//!
//! Rows are compared through their serde JSON form. Semantics follow the SQL
//! the same filter produces for PostgreSQL: comparisons against NULL never
//! match, NULLs sort after every value in ascending order, and LIKE patterns
//! use `%` and `_` wildcards.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{ColumnKind, FilterData, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection, TableSchema};

/// Filter, sort and page `rows` the way the SQL backend would
pub fn apply<T: Serialize + Clone>(schema: &TableSchema, rows: &[T], data: &FilterData) -> Result<Vec<T>, FilterError> {
    let order = match &data.order {
        Some(order) => FilterOrder::validate_and_parse(schema, order)?,
        None => vec![],
    };
    if let Some(l) = data.limit.filter(|l| *l < 0) {
        return Err(FilterError::InvalidLimit(l.to_string()));
    }
    if let Some(o) = data.offset.filter(|o| *o < 0) {
        return Err(FilterError::InvalidOffset(o.to_string()));
    }

    let mut selected = Vec::new();
    for row in rows {
        let json = serde_json::to_value(row)?;
        if matches_where(schema, data.where_clause.as_ref(), &json)? {
            selected.push((json, row));
        }
    }

    sort_rows(&order, &mut selected);

    let offset = data.offset.unwrap_or(0) as usize;
    let limit = data.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    Ok(selected.into_iter().skip(offset).take(limit).map(|(_, row)| row.clone()).collect())
}

pub fn count<T: Serialize>(schema: &TableSchema, rows: &[T], data: &FilterData) -> Result<usize, FilterError> {
    let mut total = 0;
    for row in rows {
        let json = serde_json::to_value(row)?;
        if matches_where(schema, data.where_clause.as_ref(), &json)? {
            total += 1;
        }
    }
    Ok(total)
}

pub fn matches_where(schema: &TableSchema, where_data: Option<&Value>, row: &Value) -> Result<bool, FilterError> {
    let Some(where_data) = where_data else {
        return Ok(true);
    };
    FilterWhere::validate(where_data)?;

    let obj = match where_data {
        Value::Object(obj) => obj,
        _ => return Ok(true),
    };

    for (key, value) in obj {
        if !key.starts_with('$') {
            continue;
        }
        let op = FilterOp::parse(key)
            .filter(|op| op.is_logical())
            .ok_or_else(|| FilterError::UnsupportedOperator(key.clone()))?;
        if !matches_logical(schema, op, value, row)? {
            return Ok(false);
        }
    }

    for condition in FilterWhere::parse_conditions(schema, obj)? {
        if !matches_condition(&condition, row) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_logical(schema: &TableSchema, op: FilterOp, value: &Value, row: &Value) -> Result<bool, FilterError> {
    match op {
        FilterOp::And | FilterOp::Or => {
            let arr = value
                .as_array()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{:?} requires array", op)))?;
            let mut any = false;
            let mut all = true;
            for v in arr {
                let matched = matches_where(schema, Some(v), row)?;
                any |= matched;
                all &= matched;
            }
            Ok(if op == FilterOp::And { all } else { any })
        }
        FilterOp::Not => Ok(!matches_where(schema, Some(value), row)?),
        other => Err(FilterError::UnsupportedOperator(format!("{:?}", other))),
    }
}

fn matches_condition(condition: &FilterWhereInfo, row: &Value) -> bool {
    let actual = row.get(&condition.column).unwrap_or(&Value::Null);
    let expected = &condition.data;
    let kind = condition.kind;

    match condition.operator {
        FilterOp::Eq if expected.is_null() => actual.is_null(),
        FilterOp::Ne if expected.is_null() => !actual.is_null(),
        FilterOp::Eq => compare(kind, actual, expected) == Some(Ordering::Equal),
        FilterOp::Ne => matches!(compare(kind, actual, expected), Some(o) if o != Ordering::Equal),
        FilterOp::Gt => compare(kind, actual, expected) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(kind, actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(kind, actual, expected) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(kind, actual, expected), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like | FilterOp::ILike => match (actual.as_str(), expected.as_str()) {
            (Some(text), Some(pattern)) => like(text, pattern, condition.operator == FilterOp::ILike),
            _ => false,
        },
        FilterOp::In | FilterOp::NIn => {
            let values = expected.as_array().map(Vec::as_slice).unwrap_or_default();
            if condition.operator == FilterOp::NIn && values.is_empty() {
                return true;
            }
            if actual.is_null() {
                return false;
            }
            let found = values.iter().any(|v| compare(kind, actual, v) == Some(Ordering::Equal));
            found == (condition.operator == FilterOp::In)
        }
        FilterOp::And | FilterOp::Or | FilterOp::Not => false,
    }
}

/// Typed comparison; `None` when either side is NULL or the values are incomparable
pub fn compare(kind: ColumnKind, a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    match kind {
        ColumnKind::Int => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        ColumnKind::Bool => Some(a.as_bool()?.cmp(&b.as_bool()?)),
        ColumnKind::Text => Some(a.as_str()?.cmp(b.as_str()?)),
        ColumnKind::Timestamp => {
            let x = DateTime::parse_from_rfc3339(a.as_str()?).ok()?;
            let y = DateTime::parse_from_rfc3339(b.as_str()?).ok()?;
            Some(x.cmp(&y))
        }
        ColumnKind::Date => {
            let x = NaiveDate::parse_from_str(a.as_str()?, "%Y-%m-%d").ok()?;
            let y = NaiveDate::parse_from_str(b.as_str()?, "%Y-%m-%d").ok()?;
            Some(x.cmp(&y))
        }
        ColumnKind::Json | ColumnKind::TextArray => (a == b).then_some(Ordering::Equal),
    }
}

fn sort_rows<T>(order: &[FilterOrderInfo], rows: &mut [(Value, T)]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|(a, _), (b, _)| {
        for info in order {
            let x = a.get(&info.column).unwrap_or(&Value::Null);
            let y = b.get(&info.column).unwrap_or(&Value::Null);
            // NULL sorts as the largest value
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(info.kind, x, y).unwrap_or(Ordering::Equal),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// SQL LIKE: `%` matches any run, `_` one character, `\` escapes
pub fn like(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };

    #[derive(Clone, Copy)]
    enum Token {
        Any,
        One,
        Char(char),
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            c => Token::Char(c),
        });
    }

    let text: Vec<char> = text.chars().collect();
    // reachable[j]: pattern prefix matched against the first j characters
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::Any => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            Token::One => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j];
                }
            }
            Token::Char(c) => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j] && text[j] == c;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}
