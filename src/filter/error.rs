use thiserror::Error;

/// Rejections raised while turning a `FilterData` into SQL or matching it in memory.
/// Column names are checked against the model's `TableSchema`, so an unknown
/// column never reaches a query string.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unknown column: {0}")]
    InvalidColumn(String),
    #[error("Malformed where clause: {0}")]
    InvalidWhereClause(String),
    #[error("Operator not supported: {0}")]
    UnsupportedOperator(String),
    #[error("Bad operand: {0}")]
    InvalidOperatorData(String),
    #[error("Bad ordering: {0}")]
    InvalidOrder(String),
    #[error("Limit must not be negative, got {0}")]
    InvalidLimit(String),
    #[error("Offset must not be negative, got {0}")]
    InvalidOffset(String),
    #[error("Row is not representable as JSON: {0}")]
    Json(#[from] serde_json::Error),
}
