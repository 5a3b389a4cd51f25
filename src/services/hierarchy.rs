//! In-memory view of the division tree.
//!
//! Built from a snapshot of every division (soft-deleted ones included) so
//! walks along the parent pointer or the children set always run to
//! completion without further queries.

use std::collections::{HashMap, HashSet};

use crate::database::models::Division;

pub struct DivisionTree {
    by_id: HashMap<i64, Division>,
    // child ids per parent (None = top level), ordered by code
    children: HashMap<Option<i64>, Vec<i64>>,
}

impl DivisionTree {
    pub fn new(divisions: Vec<Division>) -> Self {
        let mut children: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
        for division in &divisions {
            children.entry(division.parent_id).or_default().push(division.id);
        }

        let by_id: HashMap<i64, Division> = divisions.into_iter().map(|d| (d.id, d)).collect();
        for ids in children.values_mut() {
            ids.sort_by(|a, b| by_id[a].code.cmp(&by_id[b].code));
        }

        Self { by_id, children }
    }

    pub fn get(&self, id: i64) -> Option<&Division> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn child_ids(&self, parent: Option<i64>) -> &[i64] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    fn collect(&self, ids: &[i64], active_only: bool) -> Vec<&Division> {
        ids.iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(|d| !active_only || d.is_active())
            .collect()
    }

    /// Top-level divisions ordered by code
    pub fn roots(&self, active_only: bool) -> Vec<&Division> {
        self.collect(self.child_ids(None), active_only)
    }

    pub fn children(&self, id: i64, active_only: bool) -> Vec<&Division> {
        self.collect(self.child_ids(Some(id)), active_only)
    }

    pub fn active_children(&self, id: i64) -> Vec<&Division> {
        self.children(id, true)
    }

    /// Parent chain, nearest parent first
    pub fn ancestors(&self, id: i64) -> Vec<&Division> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.get(id).and_then(|d| d.parent_id);

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            match self.get(parent_id) {
                Some(parent) => {
                    ancestors.push(parent);
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        ancestors
    }

    /// Every division below `id`, soft-deleted ones included, depth first
    pub fn descendants(&self, id: i64) -> Vec<&Division> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        self.walk_down(id, &mut seen, &mut out);
        out
    }

    fn walk_down<'a>(&'a self, id: i64, seen: &mut HashSet<i64>, out: &mut Vec<&'a Division>) {
        for child_id in self.child_ids(Some(id)) {
            if !seen.insert(*child_id) {
                continue;
            }
            if let Some(child) = self.by_id.get(child_id) {
                out.push(child);
                self.walk_down(*child_id, seen, out);
            }
        }
    }

    pub fn descendant_ids(&self, id: i64) -> Vec<i64> {
        self.descendants(id).into_iter().map(|d| d.id).collect()
    }

    pub fn root(&self, id: i64) -> Option<&Division> {
        self.ancestors(id).last().copied().or_else(|| self.get(id))
    }

    /// Same parent, excluding `id`; top-level divisions are siblings of each other
    pub fn siblings(&self, id: i64) -> Vec<&Division> {
        let Some(division) = self.get(id) else {
            return vec![];
        };
        self.collect(self.child_ids(division.parent_id), false)
            .into_iter()
            .filter(|d| d.id != id)
            .collect()
    }

    /// Names from the root down, e.g. `HR Department > HR Manager > Recruitment`
    pub fn full_path(&self, id: i64) -> String {
        let Some(division) = self.get(id) else {
            return String::new();
        };
        let mut names: Vec<&str> = self.ancestors(id).iter().map(|d| d.name.as_str()).collect();
        names.reverse();
        names.push(&division.name);
        names.join(" > ")
    }

    pub fn level_under(&self, parent: Option<i64>) -> i32 {
        parent
            .and_then(|p| self.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0)
    }

    /// Deepest level the subtree rooted at `id` would reach under `new_parent`
    pub fn depth_after_move(&self, id: i64, new_parent: Option<i64>) -> i32 {
        let new_level = self.level_under(new_parent);
        let Some(division) = self.get(id) else {
            return new_level;
        };
        let below = self
            .descendants(id)
            .iter()
            .map(|d| d.level - division.level)
            .max()
            .unwrap_or(0);
        new_level + below.max(0)
    }

    pub fn would_create_cycle(&self, id: i64, new_parent: Option<i64>) -> bool {
        match new_parent {
            None => false,
            Some(parent) if parent == id => true,
            Some(parent) => self.descendants(id).iter().any(|d| d.id == parent),
        }
    }

    /// New levels for `id` and its subtree once it hangs under `new_parent`
    pub fn relevel(&self, id: i64, new_parent: Option<i64>) -> Vec<(i64, i32)> {
        let mut updates = vec![(id, self.level_under(new_parent))];
        let mut i = 0;
        while i < updates.len() {
            let (parent_id, parent_level) = updates[i];
            for child_id in self.child_ids(Some(parent_id)) {
                if *child_id != id && !updates.iter().any(|(u, _)| u == child_id) {
                    updates.push((*child_id, parent_level + 1));
                }
            }
            i += 1;
        }
        updates
    }

    /// Active employees of `id` plus, recursively, those of each non-deleted child
    pub fn total_employee_count(&self, id: i64, counts: &HashMap<i64, i64>) -> i64 {
        let mut seen = HashSet::new();
        self.total_from(id, counts, &mut seen)
    }

    fn total_from(&self, id: i64, counts: &HashMap<i64, i64>, seen: &mut HashSet<i64>) -> i64 {
        if !seen.insert(id) {
            return 0;
        }
        let own = counts.get(&id).copied().unwrap_or(0);
        let below: i64 = self
            .children(id, true)
            .iter()
            .map(|child| self.total_from(child.id, counts, seen))
            .sum();
        own + below
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewDivision, SoftDelete};
    use chrono::Utc;

    fn division(id: i64, code: &str, name: &str, parent: Option<i64>, level: i32) -> Division {
        Division::from_new(
            id,
            NewDivision {
                code: code.into(),
                name: name.into(),
                parent_id: parent,
                level,
                ..NewDivision::default()
            },
            Utc::now(),
        )
    }

    // HR(1) -> HR-MGR(2) -> HR-REC(3)
    //       -> HR-ADM(4)
    // IT(5)
    fn sample() -> DivisionTree {
        DivisionTree::new(vec![
            division(1, "HR", "HR Department", None, 0),
            division(2, "HR-MGR", "HR Manager", Some(1), 1),
            division(3, "HR-REC", "Recruitment", Some(2), 2),
            division(4, "HR-ADM", "Administration", Some(1), 1),
            division(5, "IT", "IT Department", None, 0),
        ])
    }

    fn ids(divisions: Vec<&Division>) -> Vec<i64> {
        divisions.into_iter().map(|d| d.id).collect()
    }

    #[test]
    fn children_are_ordered_by_code() {
        let tree = sample();
        assert_eq!(ids(tree.children(1, false)), vec![4, 2]);
        assert_eq!(ids(tree.roots(true)), vec![1, 5]);
    }

    #[test]
    fn ancestors_walk_bottom_to_top() {
        let tree = sample();
        assert_eq!(ids(tree.ancestors(3)), vec![2, 1]);
        assert!(tree.ancestors(1).is_empty());
        assert_eq!(tree.root(3).map(|d| d.id), Some(1));
        assert_eq!(tree.root(5).map(|d| d.id), Some(5));
    }

    #[test]
    fn full_path_joins_names_from_root() {
        let tree = sample();
        assert_eq!(tree.full_path(3), "HR Department > HR Manager > Recruitment");
        assert_eq!(tree.full_path(5), "IT Department");
    }

    #[test]
    fn descendants_include_soft_deleted() {
        let mut divisions = vec![
            division(1, "HR", "HR Department", None, 0),
            division(2, "HR-MGR", "HR Manager", Some(1), 1),
            division(3, "HR-REC", "Recruitment", Some(2), 2),
        ];
        divisions[1].soft_delete(None);
        let tree = DivisionTree::new(divisions);

        assert_eq!(tree.descendant_ids(1), vec![2, 3]);
        assert!(tree.active_children(1).is_empty());
    }

    #[test]
    fn siblings_exclude_self() {
        let tree = sample();
        assert_eq!(ids(tree.siblings(2)), vec![4]);
        assert_eq!(ids(tree.siblings(1)), vec![5]);
    }

    #[test]
    fn detects_cycles() {
        let tree = sample();
        assert!(tree.would_create_cycle(1, Some(1)));
        assert!(tree.would_create_cycle(1, Some(3)));
        assert!(!tree.would_create_cycle(2, Some(5)));
        assert!(!tree.would_create_cycle(2, None));
    }

    #[test]
    fn moving_a_subtree_recomputes_levels() {
        let tree = sample();
        assert_eq!(tree.depth_after_move(2, Some(5)), 2);
        assert_eq!(tree.depth_after_move(2, None), 1);

        let mut updates = tree.relevel(2, Some(5));
        updates.sort();
        assert_eq!(updates, vec![(2, 1), (3, 2)]);

        let mut updates = tree.relevel(2, Some(4));
        updates.sort();
        assert_eq!(updates, vec![(2, 2), (3, 3)]);
    }

    #[test]
    fn total_counts_skip_deleted_children() {
        let mut divisions = vec![
            division(1, "HR", "HR Department", None, 0),
            division(2, "HR-MGR", "HR Manager", Some(1), 1),
            division(3, "HR-ADM", "Administration", Some(1), 1),
        ];
        divisions[2].soft_delete(None);
        let tree = DivisionTree::new(divisions);
        let counts = HashMap::from([(1, 2), (2, 3), (3, 10)]);

        assert_eq!(tree.total_employee_count(1, &counts), 5);
        assert_eq!(tree.total_employee_count(2, &counts), 3);
    }
}
