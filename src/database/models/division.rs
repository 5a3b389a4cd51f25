use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::audit::{AuditFields, SoftDelete};
use crate::filter::{ColumnKind, TableSchema};

/// Deepest level a division may sit at (levels are 0-based, five in total)
pub const MAX_LEVEL: i32 = 4;

/// Hard ceiling enforced whenever a level is computed
pub const LEVEL_GUARD: i32 = 5;

pub const DIVISIONS: TableSchema = TableSchema {
    name: "divisions",
    columns: &[
        ("id", ColumnKind::Int),
        ("code", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("description", ColumnKind::Text),
        ("parent_id", ColumnKind::Int),
        ("level", ColumnKind::Int),
        ("created_at", ColumnKind::Timestamp),
        ("updated_at", ColumnKind::Timestamp),
        ("is_active", ColumnKind::Bool),
        ("deleted_at", ColumnKind::Timestamp),
        ("deleted_by", ColumnKind::Int),
    ],
};

/// Default ordering
pub const DEFAULT_ORDER: &str = "level, code";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Division {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
    pub level: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, Default)]
pub struct NewDivision {
    pub code: String,
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
    pub level: i32,
}

impl Division {
    pub fn from_new(id: i64, new: NewDivision, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: new.code,
            name: new.name,
            description: new.description,
            parent_id: new.parent_id,
            level: new.level,
            audit: AuditFields::new(now),
        }
    }

    pub fn is_active(&self) -> bool {
        self.audit.is_active
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// `PARENT > CODE - Name`, or `CODE - Name` at the top level
    pub fn label(&self, parent_code: Option<&str>) -> String {
        match parent_code {
            Some(parent) => format!("{} > {} - {}", parent, self.code, self.name),
            None => format!("{} - {}", self.code, self.name),
        }
    }
}

impl SoftDelete for Division {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Division {
        Division::from_new(
            3,
            NewDivision {
                code: "HR-REC".into(),
                name: "Recruitment".into(),
                parent_id: Some(1),
                level: 1,
                ..NewDivision::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn labels() {
        let div = sample();
        assert_eq!(div.label(Some("HR")), "HR > HR-REC - Recruitment");
        assert_eq!(div.label(None), "HR-REC - Recruitment");
    }

    #[test]
    fn serializes_flat_audit_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["is_active"], true);
        assert!(json["created_at"].is_string());
        assert!(json.get("audit").is_none());
    }

    #[test]
    fn soft_delete_through_trait() {
        let mut div = sample();
        div.soft_delete(Some(1));
        assert!(div.is_deleted());
        assert!(!div.is_active());
    }
}
