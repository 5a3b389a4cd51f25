use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::database::models::division::{DEFAULT_ORDER, LEVEL_GUARD, MAX_LEVEL};
use crate::database::models::{Division, NewDivision, SoftDelete, SoftDeleteScope, User};
use crate::database::{DatabaseError, Store};
use crate::filter::FilterData;
use crate::services::hierarchy::DivisionTree;
use crate::services::search_pattern;
use crate::validation::{limits, normalize_division_code, FieldErrors};

const DEPTH_EXCEEDED: &str = "Maximum hierarchy depth is 5 levels";

#[derive(Debug, thiserror::Error)]
pub enum DivisionError {
    #[error("Division {0} not found")]
    NotFound(i64),

    #[error("Invalid division data: {}", .0.summary())]
    Invalid(FieldErrors),

    #[error("Cannot delete a division that still has active sub-divisions")]
    HasActiveChildren,

    #[error("Cannot delete a division that still has active employees")]
    HasActiveEmployees,

    #[error("Cannot restore a division whose parent is deleted")]
    ParentDeleted,

    #[error("Cannot purge a division while employees still belong to it or its sub-divisions")]
    InUse,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<FieldErrors> for DivisionError {
    fn from(errors: FieldErrors) -> Self {
        DivisionError::Invalid(errors)
    }
}

/// Sortable fields of the division listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionSort {
    Code,
    Name,
    Level,
    CreatedAt,
    EmployeeCount,
}

impl DivisionSort {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "code" => Some(DivisionSort::Code),
            "name" => Some(DivisionSort::Name),
            "level" => Some(DivisionSort::Level),
            "created_at" => Some(DivisionSort::CreatedAt),
            "employee_count" => Some(DivisionSort::EmployeeCount),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            DivisionSort::Code => "code",
            DivisionSort::Name => "name",
            DivisionSort::Level => "level",
            DivisionSort::CreatedAt => "created_at",
            DivisionSort::EmployeeCount => "employee_count",
        }
    }
}

/// `?ordering=` terms; unknown fields are dropped, and nothing valid means the default order
pub fn parse_ordering(raw: Option<&str>) -> Vec<(DivisionSort, bool)> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|term| {
            let (field, descending) = match term.strip_prefix('-') {
                Some(field) => (field, true),
                None => (term, false),
            };
            DivisionSort::parse(field).map(|sort| (sort, descending))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    #[default]
    Any,
    TopLevel,
    Id(i64),
}

#[derive(Debug, Clone, Default)]
pub struct DivisionQuery {
    pub search: Option<String>,
    pub level: Option<i32>,
    pub parent: ParentFilter,
    pub top_only: bool,
    pub ordering: Vec<(DivisionSort, bool)>,
}

impl DivisionQuery {
    fn to_filter(&self) -> FilterData {
        let mut conditions = vec![json!({ "is_active": true })];

        if let Some(level) = self.level {
            conditions.push(json!({ "level": level }));
        }
        match self.parent {
            ParentFilter::Any => {}
            ParentFilter::TopLevel => conditions.push(json!({ "parent_id": null })),
            ParentFilter::Id(id) => conditions.push(json!({ "parent_id": id })),
        }
        if self.top_only {
            conditions.push(json!({ "parent_id": null }));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = search_pattern(term);
            conditions.push(json!({ "$or": [
                { "name": { "$ilike": pattern } },
                { "code": { "$ilike": pattern } },
                { "description": { "$ilike": pattern } },
            ]}));
        }

        FilterData::new().with_where(json!({ "$and": conditions }))
    }

    fn sorts_by_employee_count(&self) -> bool {
        self.ordering.iter().any(|(sort, _)| *sort == DivisionSort::EmployeeCount)
    }

    fn order_value(&self) -> Value {
        if self.ordering.is_empty() {
            return Value::String(format!("{}, id", DEFAULT_ORDER));
        }
        let mut terms: Vec<String> = self
            .ordering
            .iter()
            .map(|(sort, desc)| format!("{}{}", if *desc { "-" } else { "" }, sort.column()))
            .collect();
        terms.push("id".to_string());
        Value::String(terms.join(", "))
    }
}

/// A division with the figures shown in listings
#[derive(Debug, Clone)]
pub struct DivisionRow {
    pub division: Division,
    pub parent_name: Option<String>,
    pub employee_count: i64,
}

#[derive(Debug, Clone)]
pub struct DivisionNode {
    pub row: DivisionRow,
    pub children: Vec<DivisionNode>,
}

#[derive(Debug, Clone)]
pub struct DivisionDetail {
    pub row: DivisionRow,
    pub full_path: String,
    pub total_employee_count: i64,
    pub children: Vec<DivisionRow>,
    pub ancestors: Vec<Division>,
}

#[derive(Debug, Clone)]
pub struct DivisionEmployee {
    pub user: User,
    pub division_name: Option<String>,
}

/// One line of the administrative outline
#[derive(Debug, Clone)]
pub struct OutlineRow {
    pub division: Division,
    pub employee_count: i64,
    pub total_employee_count: i64,
}

/// Fields accepted on create and update; `None` means "not supplied"
#[derive(Debug, Clone, Default)]
pub struct DivisionInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<Option<i64>>,
}

pub struct DivisionService {
    store: Arc<dyn Store>,
}

impl DivisionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Snapshot of every division, soft-deleted ones included
    pub async fn tree(&self) -> Result<DivisionTree, DivisionError> {
        let all = self.store.select_divisions(&FilterData::new()).await?;
        Ok(DivisionTree::new(all))
    }

    /// Active employees per division id
    pub async fn employee_counts(&self) -> Result<HashMap<i64, i64>, DivisionError> {
        let filter = FilterData::new().with_where(json!({ "is_active": true, "division_id": { "$ne": null } }));
        let mut counts = HashMap::new();
        for user in self.store.select_users(&filter).await? {
            if let Some(division_id) = user.division_id {
                *counts.entry(division_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn active(&self, id: i64) -> Result<Division, DivisionError> {
        match self.store.get_division(id).await? {
            Some(division) if division.is_active() => Ok(division),
            _ => Err(DivisionError::NotFound(id)),
        }
    }

    fn row(tree: &DivisionTree, counts: &HashMap<i64, i64>, division: &Division) -> DivisionRow {
        DivisionRow {
            parent_name: division.parent_id.and_then(|p| tree.get(p)).map(|p| p.name.clone()),
            employee_count: counts.get(&division.id).copied().unwrap_or(0),
            division: division.clone(),
        }
    }

    /// One page of active divisions plus the total matching count
    pub async fn list(&self, query: &DivisionQuery, limit: i64, offset: i64) -> Result<(i64, Vec<DivisionRow>), DivisionError> {
        let filter = query.to_filter();
        let total = self.store.count_divisions(&filter).await?;
        let tree = self.tree().await?;
        let counts = self.employee_counts().await?;

        let divisions = if query.sorts_by_employee_count() {
            let default_order = format!("{}, id", DEFAULT_ORDER);
            let mut all = self.store.select_divisions(&filter.with_order(default_order)).await?;
            all.sort_by(|a, b| compare_rows(&query.ordering, &counts, a, b));
            all.into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect()
        } else {
            self.store
                .select_divisions(&filter.with_order(query.order_value()).paginate(limit, offset))
                .await?
        };

        let rows = divisions.iter().map(|d| Self::row(&tree, &counts, d)).collect();
        Ok((total, rows))
    }

    pub async fn detail(&self, id: i64) -> Result<DivisionDetail, DivisionError> {
        let division = self.active(id).await?;
        let tree = self.tree().await?;
        let counts = self.employee_counts().await?;

        Ok(DivisionDetail {
            full_path: tree.full_path(id),
            total_employee_count: tree.total_employee_count(id, &counts),
            children: tree
                .active_children(id)
                .into_iter()
                .map(|child| Self::row(&tree, &counts, child))
                .collect(),
            ancestors: tree.ancestors(id).into_iter().cloned().collect(),
            row: Self::row(&tree, &counts, &division),
        })
    }

    pub async fn create(&self, input: DivisionInput) -> Result<Division, DivisionError> {
        let mut errors = FieldErrors::new();

        let code = match errors.require("code", input.code.as_deref()) {
            Some(raw) => {
                errors.check_max_length("code", raw, limits::DIVISION_CODE);
                match normalize_division_code(raw) {
                    Ok(code) => Some(code),
                    Err(message) => {
                        errors.add("code", message);
                        None
                    }
                }
            }
            None => None,
        };
        let name = errors.require("name", input.name.as_deref()).map(str::to_string);
        if let Some(name) = &name {
            errors.check_max_length("name", name, limits::DIVISION_NAME);
        }

        let parent_id = input.parent.flatten();
        let parent = match parent_id {
            Some(pid) => self.usable_parent(pid, &mut errors).await?,
            None => None,
        };

        let (Some(code), Some(name)) = (code, name) else {
            return Err(errors.into());
        };
        self.check_unique(None, &code, &name, parent_id, &mut errors).await?;
        errors.into_result()?;

        let level = parent.as_ref().map(|p| p.level + 1).unwrap_or(0);
        if level > LEVEL_GUARD {
            return Err(FieldErrors::from(("parent", DEPTH_EXCEEDED.to_string())).into());
        }

        let division = self
            .store
            .insert_division(NewDivision {
                code,
                name,
                description: input.description.unwrap_or_default(),
                parent_id,
                level,
            })
            .await?;
        info!("Created division {} ({}) at level {}", division.code, division.id, division.level);
        Ok(division)
    }

    /// PUT when `partial` is false: code and name must be supplied
    pub async fn update(&self, id: i64, input: DivisionInput, partial: bool) -> Result<Division, DivisionError> {
        let mut division = self.active(id).await?;
        let mut errors = FieldErrors::new();

        if !partial {
            errors.require("code", input.code.as_deref());
            errors.require("name", input.name.as_deref());
        }

        if let Some(raw) = input.code.as_deref() {
            if let Some(code) = errors.require("code", Some(raw)) {
                errors.check_max_length("code", code, limits::DIVISION_CODE);
                match normalize_division_code(code) {
                    Ok(code) => division.code = code,
                    Err(message) => errors.add("code", message),
                }
            }
        }
        if let Some(raw) = input.name.as_deref() {
            if let Some(name) = errors.require("name", Some(raw)) {
                errors.check_max_length("name", name, limits::DIVISION_NAME);
                division.name = name.to_string();
            }
        }
        if let Some(description) = input.description {
            division.description = description;
        }

        let tree = self.tree().await?;
        let old_parent = division.parent_id;
        if let Some(new_parent) = input.parent {
            if let Some(pid) = new_parent {
                if pid == id {
                    errors.add("parent", "A division cannot be its own parent");
                } else if tree.would_create_cycle(id, Some(pid)) {
                    errors.add("parent", "A sub-division cannot become the parent of its ancestor");
                } else if self.usable_parent(pid, &mut errors).await?.is_some()
                    && tree.depth_after_move(id, Some(pid)) > MAX_LEVEL
                {
                    errors.add("parent", DEPTH_EXCEEDED);
                }
            }
            division.parent_id = new_parent;
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }
        self.check_unique(Some(id), &division.code, &division.name, division.parent_id, &mut errors)
            .await?;
        errors.into_result()?;

        division.level = tree.level_under(division.parent_id);
        let updated = self.store.update_division(&division).await?;

        if old_parent != updated.parent_id {
            for (descendant_id, level) in tree.relevel(id, updated.parent_id) {
                if descendant_id == id {
                    continue;
                }
                if let Some(descendant) = tree.get(descendant_id) {
                    if descendant.level != level {
                        let mut moved = descendant.clone();
                        moved.level = level;
                        self.store.update_division(&moved).await?;
                    }
                }
            }
            info!("Moved division {} under {:?} (level {})", updated.code, updated.parent_id, updated.level);
        }
        Ok(updated)
    }

    /// Parent must exist, be active and leave room for one more level
    async fn usable_parent(&self, pid: i64, errors: &mut FieldErrors) -> Result<Option<Division>, DivisionError> {
        match self.store.get_division(pid).await? {
            Some(parent) if parent.is_active() => {
                if parent.level >= MAX_LEVEL {
                    errors.add("parent", DEPTH_EXCEEDED);
                    Ok(None)
                } else {
                    Ok(Some(parent))
                }
            }
            _ => {
                errors.add("parent", format!("Invalid pk \"{}\" - object does not exist.", pid));
                Ok(None)
            }
        }
    }

    async fn check_unique(
        &self,
        exclude: Option<i64>,
        code: &str,
        name: &str,
        parent_id: Option<i64>,
        errors: &mut FieldErrors,
    ) -> Result<(), DivisionError> {
        let not_self = |d: &Division| Some(d.id) != exclude;

        let same_code = self
            .store
            .select_divisions(&FilterData::new().with_where(json!({ "code": code })))
            .await?;
        if same_code.iter().any(not_self) {
            errors.add("code", "division with this code already exists.");
        }

        let same_name = self
            .store
            .select_divisions(&FilterData::new().with_where(json!({ "name": name, "parent_id": parent_id })))
            .await?;
        if same_name.iter().any(not_self) {
            errors.add("non_field_errors", "The fields name, parent must make a unique set.");
        }
        Ok(())
    }

    pub async fn soft_delete(&self, id: i64, by: i64) -> Result<(), DivisionError> {
        let mut division = self.active(id).await?;

        let active_children = self
            .store
            .count_divisions(&SoftDeleteScope::Active.apply(FilterData::new().with_where(json!({ "parent_id": id }))))
            .await?;
        if active_children > 0 {
            return Err(DivisionError::HasActiveChildren);
        }

        let active_employees = self
            .store
            .count_users(&FilterData::new().with_where(json!({ "division_id": id, "is_active": true })))
            .await?;
        if active_employees > 0 {
            return Err(DivisionError::HasActiveEmployees);
        }

        division.soft_delete(Some(by));
        self.store.update_division(&division).await?;
        info!("Soft deleted division {} ({}) by user {}", division.code, id, by);
        Ok(())
    }

    pub async fn restore(&self, id: i64) -> Result<Division, DivisionError> {
        let mut division = self.store.get_division(id).await?.ok_or(DivisionError::NotFound(id))?;
        if division.is_active() {
            return Ok(division);
        }

        if let Some(parent_id) = division.parent_id {
            let parent_active = self.store.get_division(parent_id).await?.is_some_and(|p| p.is_active());
            if !parent_active {
                return Err(DivisionError::ParentDeleted);
            }
        }

        division.restore();
        let restored = self.store.update_division(&division).await?;
        info!("Restored division {} ({})", restored.code, id);
        Ok(restored)
    }

    /// Hard delete of the division and its subtree; refused while any user points into it
    pub async fn purge(&self, id: i64) -> Result<u64, DivisionError> {
        let tree = self.tree().await?;
        if tree.get(id).is_none() {
            return Err(DivisionError::NotFound(id));
        }

        let mut ids = tree.descendant_ids(id);
        ids.push(id);
        let referencing = self
            .store
            .count_users(&FilterData::new().with_where(json!({ "division_id": { "$in": ids } })))
            .await?;
        if referencing > 0 {
            return Err(DivisionError::InUse);
        }

        let removed = self.store.delete_division(id).await?;
        info!("Purged division {} and {} sub-division(s)", id, removed.saturating_sub(1));
        Ok(removed)
    }

    pub async fn children(&self, id: i64) -> Result<Vec<DivisionRow>, DivisionError> {
        self.active(id).await?;
        let tree = self.tree().await?;
        let counts = self.employee_counts().await?;
        Ok(tree
            .active_children(id)
            .into_iter()
            .map(|child| Self::row(&tree, &counts, child))
            .collect())
    }

    /// Nearest parent first
    pub async fn ancestors(&self, id: i64) -> Result<Vec<Division>, DivisionError> {
        self.active(id).await?;
        let tree = self.tree().await?;
        Ok(tree.ancestors(id).into_iter().cloned().collect())
    }

    /// Active top-level divisions with their active subtrees
    pub async fn tree_view(&self) -> Result<Vec<DivisionNode>, DivisionError> {
        let tree = self.tree().await?;
        let counts = self.employee_counts().await?;

        fn build(tree: &DivisionTree, counts: &HashMap<i64, i64>, division: &Division) -> DivisionNode {
            DivisionNode {
                row: DivisionService::row(tree, counts, division),
                children: tree
                    .active_children(division.id)
                    .into_iter()
                    .map(|child| build(tree, counts, child))
                    .collect(),
            }
        }

        Ok(tree.roots(true).into_iter().map(|root| build(&tree, &counts, root)).collect())
    }

    pub async fn employees(&self, id: i64, include_children: bool) -> Result<(Division, Vec<DivisionEmployee>), DivisionError> {
        let division = self.active(id).await?;
        let tree = self.tree().await?;

        let mut ids = vec![id];
        if include_children {
            ids.extend(tree.descendant_ids(id));
        }

        let filter = FilterData::new()
            .with_where(json!({ "is_active": true, "division_id": { "$in": ids } }))
            .with_order("employee_id");
        let employees = self
            .store
            .select_users(&filter)
            .await?
            .into_iter()
            .map(|user| DivisionEmployee {
                division_name: user.division_id.and_then(|d| tree.get(d)).map(|d| d.name.clone()),
                user,
            })
            .collect();

        Ok((division, employees))
    }

    /// Depth-first outline of the hierarchy restricted to `scope`
    pub async fn outline(&self, scope: SoftDeleteScope) -> Result<Vec<OutlineRow>, DivisionError> {
        let tree = self.tree().await?;
        let counts = self.employee_counts().await?;

        let in_scope = |d: &Division| match scope {
            SoftDeleteScope::Active => d.is_active(),
            SoftDeleteScope::Deleted => !d.is_active(),
            SoftDeleteScope::All => true,
        };

        let mut rows = Vec::new();
        for root in tree.roots(false) {
            for division in std::iter::once(root).chain(tree.descendants(root.id)) {
                if in_scope(division) {
                    rows.push(OutlineRow {
                        division: division.clone(),
                        employee_count: counts.get(&division.id).copied().unwrap_or(0),
                        total_employee_count: tree.total_employee_count(division.id, &counts),
                    });
                }
            }
        }
        Ok(rows)
    }
}

fn compare_rows(
    ordering: &[(DivisionSort, bool)],
    counts: &HashMap<i64, i64>,
    a: &Division,
    b: &Division,
) -> Ordering {
    for (sort, descending) in ordering {
        let ord = match sort {
            DivisionSort::Code => a.code.cmp(&b.code),
            DivisionSort::Name => a.name.cmp(&b.name),
            DivisionSort::Level => a.level.cmp(&b.level),
            DivisionSort::CreatedAt => a.audit.created_at.cmp(&b.audit.created_at),
            DivisionSort::EmployeeCount => {
                let count = |d: &Division| counts.get(&d.id).copied().unwrap_or(0);
                count(a).cmp(&count(b))
            }
        };
        let ord = if *descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id.cmp(&b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::MemoryStore;

    fn service() -> (DivisionService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (DivisionService::new(store.clone()), store)
    }

    fn input(code: &str, name: &str, parent: Option<i64>) -> DivisionInput {
        DivisionInput {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            description: None,
            parent: Some(parent),
        }
    }

    async fn employee(store: &Arc<dyn Store>, username: &str, division: i64) -> User {
        store
            .insert_user(NewUser {
                username: username.into(),
                email: format!("{}@example.com", username),
                employee_id: username.to_uppercase(),
                division_id: Some(division),
                ..NewUser::default()
            })
            .await
            .unwrap()
    }

    #[test]
    fn ordering_drops_unknown_fields() {
        assert_eq!(
            parse_ordering(Some("-employee_count, bogus,name")),
            vec![(DivisionSort::EmployeeCount, true), (DivisionSort::Name, false)]
        );
        assert!(parse_ordering(Some("bogus")).is_empty());
        assert!(parse_ordering(None).is_empty());
    }

    #[tokio::test]
    async fn create_computes_level_and_uppercases_code() {
        let (svc, _) = service();
        let hr = svc.create(input("hr", "HR Department", None)).await.unwrap();
        let mgr = svc.create(input("hr-mgr", "HR Manager", Some(hr.id))).await.unwrap();

        assert_eq!(hr.code, "HR");
        assert_eq!(hr.level, 0);
        assert_eq!(mgr.code, "HR-MGR");
        assert_eq!(mgr.level, 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_bad_parents() {
        let (svc, _) = service();
        let hr = svc.create(input("HR", "HR Department", None)).await.unwrap();

        let Err(DivisionError::Invalid(errors)) = svc.create(input("hr", "Other", None)).await else {
            panic!("expected duplicate code");
        };
        assert!(errors.has("code"));

        let Err(DivisionError::Invalid(errors)) = svc.create(input("HR2", "HR Department", None)).await else {
            panic!("expected duplicate name");
        };
        assert!(errors.has("non_field_errors"));

        let Err(DivisionError::Invalid(errors)) = svc.create(input("X", "X", Some(999))).await else {
            panic!("expected missing parent");
        };
        assert!(errors.has("parent"));

        svc.soft_delete(hr.id, 1).await.unwrap();
        let Err(DivisionError::Invalid(errors)) = svc.create(input("Y", "Y", Some(hr.id))).await else {
            panic!("expected deleted parent");
        };
        assert!(errors.has("parent"));
    }

    #[tokio::test]
    async fn depth_is_capped_at_five_levels() {
        let (svc, _) = service();
        let mut parent = None;
        for level in 0..=MAX_LEVEL {
            let d = svc.create(input(&format!("L{}", level), &format!("Level {}", level), parent)).await.unwrap();
            assert_eq!(d.level, level);
            parent = Some(d.id);
        }

        let Err(DivisionError::Invalid(errors)) = svc.create(input("L5", "Level 5", parent)).await else {
            panic!("expected depth error");
        };
        assert_eq!(errors.get("parent"), Some(DEPTH_EXCEEDED));
    }

    #[tokio::test]
    async fn update_blocks_cycles_and_relevels_subtree() {
        let (svc, _) = service();
        let hr = svc.create(input("HR", "HR", None)).await.unwrap();
        let mgr = svc.create(input("HR-MGR", "Manager", Some(hr.id))).await.unwrap();
        let rec = svc.create(input("HR-REC", "Recruitment", Some(mgr.id))).await.unwrap();
        let it = svc.create(input("IT", "IT", None)).await.unwrap();

        let move_to = |parent| DivisionInput { parent: Some(parent), ..DivisionInput::default() };

        let Err(DivisionError::Invalid(errors)) = svc.update(hr.id, move_to(Some(hr.id)), true).await else {
            panic!("expected self-parent error");
        };
        assert!(errors.has("parent"));

        let Err(DivisionError::Invalid(errors)) = svc.update(hr.id, move_to(Some(rec.id)), true).await else {
            panic!("expected cycle error");
        };
        assert!(errors.has("parent"));

        let moved = svc.update(hr.id, move_to(Some(it.id)), true).await.unwrap();
        assert_eq!(moved.level, 1);

        let tree = svc.tree().await.unwrap();
        assert_eq!(tree.get(mgr.id).map(|d| d.level), Some(2));
        assert_eq!(tree.get(rec.id).map(|d| d.level), Some(3));
        assert_eq!(tree.full_path(rec.id), "IT > HR > Manager > Recruitment");
    }

    #[tokio::test]
    async fn moving_a_subtree_keeps_every_descendant_within_depth() {
        let (svc, _) = service();
        let a = svc.create(input("A", "A", None)).await.unwrap();
        let b = svc.create(input("B", "B", Some(a.id))).await.unwrap();
        let mut parent = None;
        for level in 0..4 {
            let d = svc.create(input(&format!("X{}", level), &format!("X{}", level), parent)).await.unwrap();
            parent = Some(d.id);
        }
        let x3 = parent.unwrap();

        let patch = DivisionInput { parent: Some(Some(x3)), ..DivisionInput::default() };
        let Err(DivisionError::Invalid(errors)) = svc.update(a.id, patch, true).await else {
            panic!("expected depth error");
        };
        assert_eq!(errors.get("parent"), Some(DEPTH_EXCEEDED));

        let tree = svc.tree().await.unwrap();
        assert_eq!(tree.get(a.id).map(|d| d.level), Some(0));
        assert_eq!(tree.get(b.id).map(|d| d.level), Some(1));

        let x2 = tree.get(x3).and_then(|d| d.parent_id).unwrap();
        let patch = DivisionInput { parent: Some(Some(x2)), ..DivisionInput::default() };
        let moved = svc.update(a.id, patch, true).await.unwrap();
        assert_eq!(moved.level, 3);
        let tree = svc.tree().await.unwrap();
        assert_eq!(tree.get(b.id).map(|d| d.level), Some(MAX_LEVEL));
    }

    #[tokio::test]
    async fn put_requires_code_and_name() {
        let (svc, _) = service();
        let hr = svc.create(input("HR", "HR", None)).await.unwrap();

        let patch = DivisionInput { description: Some("People".into()), ..DivisionInput::default() };
        let Err(DivisionError::Invalid(errors)) = svc.update(hr.id, patch.clone(), false).await else {
            panic!("expected required fields");
        };
        assert!(errors.has("code") && errors.has("name"));

        let updated = svc.update(hr.id, patch, true).await.unwrap();
        assert_eq!(updated.description, "People");
        assert_eq!(updated.code, "HR");
    }

    #[tokio::test]
    async fn soft_delete_guards() {
        let (svc, store) = service();
        let hr = svc.create(input("HR", "HR", None)).await.unwrap();
        let rec = svc.create(input("HR-REC", "Recruitment", Some(hr.id))).await.unwrap();
        let user = employee(&store, "ani", rec.id).await;

        assert!(matches!(svc.soft_delete(hr.id, 1).await, Err(DivisionError::HasActiveChildren)));
        assert!(matches!(svc.soft_delete(rec.id, 1).await, Err(DivisionError::HasActiveEmployees)));

        let mut user = user;
        user.is_active = false;
        store.update_user(&user).await.unwrap();

        svc.soft_delete(rec.id, 1).await.unwrap();
        svc.soft_delete(hr.id, 1).await.unwrap();
        assert!(matches!(svc.detail(hr.id).await, Err(DivisionError::NotFound(_))));

        let deleted = store.get_division(hr.id).await.unwrap().unwrap();
        assert_eq!(deleted.audit.deleted_by, Some(1));
    }

    #[tokio::test]
    async fn restore_needs_an_active_parent() {
        let (svc, _) = service();
        let hr = svc.create(input("HR", "HR", None)).await.unwrap();
        let rec = svc.create(input("HR-REC", "Recruitment", Some(hr.id))).await.unwrap();
        svc.soft_delete(rec.id, 1).await.unwrap();
        svc.soft_delete(hr.id, 1).await.unwrap();

        assert!(matches!(svc.restore(rec.id).await, Err(DivisionError::ParentDeleted)));
        svc.restore(hr.id).await.unwrap();
        let restored = svc.restore(rec.id).await.unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.audit.deleted_at, None);
    }

    #[tokio::test]
    async fn purge_is_blocked_by_any_referencing_user() {
        let (svc, store) = service();
        let hr = svc.create(input("HR", "HR", None)).await.unwrap();
        let rec = svc.create(input("HR-REC", "Recruitment", Some(hr.id))).await.unwrap();
        let mut user = employee(&store, "budi", rec.id).await;
        user.is_active = false;
        store.update_user(&user).await.unwrap();

        assert!(matches!(svc.purge(hr.id).await, Err(DivisionError::InUse)));

        user.division_id = None;
        store.update_user(&user).await.unwrap();
        assert_eq!(svc.purge(hr.id).await.unwrap(), 2);
        assert!(store.get_division(rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counts_and_detail() {
        let (svc, store) = service();
        let hr = svc.create(input("HR", "HR Department", None)).await.unwrap();
        let rec = svc.create(input("HR-REC", "Recruitment", Some(hr.id))).await.unwrap();
        employee(&store, "a", hr.id).await;
        employee(&store, "b", rec.id).await;
        employee(&store, "c", rec.id).await;

        let detail = svc.detail(rec.id).await.unwrap();
        assert_eq!(detail.row.parent_name.as_deref(), Some("HR Department"));
        assert_eq!(detail.row.employee_count, 2);
        assert_eq!(detail.full_path, "HR Department > Recruitment");
        assert_eq!(detail.ancestors.len(), 1);

        let detail = svc.detail(hr.id).await.unwrap();
        assert_eq!(detail.row.employee_count, 1);
        assert_eq!(detail.total_employee_count, 3);
        assert_eq!(detail.children.len(), 1);

        let (_, employees) = svc.employees(hr.id, true).await.unwrap();
        assert_eq!(employees.len(), 3);
        let (_, employees) = svc.employees(hr.id, false).await.unwrap();
        assert_eq!(employees.len(), 1);
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_employee_count() {
        let (svc, store) = service();
        let hr = svc.create(input("HR", "Human Resources", None)).await.unwrap();
        let it = svc.create(input("IT", "Information Technology", None)).await.unwrap();
        svc.create(input("IT-OPS", "Operations", Some(it.id))).await.unwrap();
        employee(&store, "x", it.id).await;
        employee(&store, "y", it.id).await;
        employee(&store, "z", hr.id).await;

        let query = DivisionQuery { ordering: parse_ordering(Some("-employee_count")), ..DivisionQuery::default() };
        let (total, rows) = svc.list(&query, 20, 0).await.unwrap();
        assert_eq!(total, 3);
        let codes: Vec<&str> = rows.iter().map(|r| r.division.code.as_str()).collect();
        assert_eq!(codes, vec!["IT", "HR", "IT-OPS"]);

        let query = DivisionQuery { top_only: true, ..DivisionQuery::default() };
        let (total, _) = svc.list(&query, 20, 0).await.unwrap();
        assert_eq!(total, 2);

        let query = DivisionQuery { search: Some("oper".into()), ..DivisionQuery::default() };
        let (total, rows) = svc.list(&query, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].parent_name.as_deref(), Some("Information Technology"));

        let (total, rows) = svc.list(&DivisionQuery::default(), 1, 1).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows[0].division.code, "IT");
    }
}
