//! Timestamp and soft-delete fields shared by audited tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::filter::FilterData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditFields {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl AuditFields {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            is_active: true,
            deleted_at: None,
            deleted_by: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Soft delete marks a row inactive instead of removing it.
pub trait SoftDelete {
    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;

    fn soft_delete(&mut self, by: Option<i64>) {
        let now = Utc::now();
        let audit = self.audit_mut();
        audit.is_active = false;
        audit.deleted_at = Some(now);
        audit.deleted_by = by;
        audit.updated_at = now;
    }

    fn restore(&mut self) {
        let audit = self.audit_mut();
        audit.is_active = true;
        audit.deleted_at = None;
        audit.deleted_by = None;
        audit.touch();
    }

    fn is_deleted(&self) -> bool {
        !self.audit().is_active
    }
}

impl SoftDelete for AuditFields {
    fn audit(&self) -> &AuditFields {
        self
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        self
    }
}

/// Which rows a query over an audited table should see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeleteScope {
    #[default]
    Active,
    Deleted,
    All,
}

impl SoftDeleteScope {
    pub fn condition(self) -> Option<Value> {
        match self {
            SoftDeleteScope::Active => Some(json!({ "is_active": true })),
            SoftDeleteScope::Deleted => Some(json!({ "is_active": false })),
            SoftDeleteScope::All => None,
        }
    }

    pub fn apply(self, filter: FilterData) -> FilterData {
        match self.condition() {
            Some(condition) => filter.and_where(condition),
            None => filter,
        }
    }
}
