//! Two-pass assembly of a flat task batch into a forest of root tasks.

use crate::models::{TaskRecord, TaskTree};
use std::collections::{HashMap, HashSet};

/// Builds the forest for one already-filtered, already-ordered batch.
///
/// Roots keep their relative input order, and so does each root's subtask
/// list. A subtask whose parent is absent from the batch (filtered out, or
/// never existed) is dropped rather than promoted to root: in normal operation
/// a subtask shares its parent's assigned days, so an orphan only shows up
/// when the store was mutated out-of-band.
///
/// Depth is bounded to two levels because `parent_id` may never reference
/// another subtask; both passes are O(n) and no recursion is needed.
pub fn assemble_forest(records: Vec<TaskRecord>) -> Vec<TaskTree> {
    let known_ids: HashSet<String> = records.iter().map(|record| record.id.clone()).collect();

    let mut roots: Vec<TaskRecord> = Vec::new();
    let mut children: HashMap<String, Vec<TaskTree>> = HashMap::new();

    for record in records {
        match record.parent_id.clone() {
            None => roots.push(record),
            Some(parent_id) if known_ids.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(TaskTree {
                    task: record,
                    subtasks: Vec::new(),
                });
            }
            Some(_) => {} // orphan
        }
    }

    roots
        .into_iter()
        .map(|task| {
            let subtasks = children.remove(&task.id).unwrap_or_default();
            TaskTree { task, subtasks }
        })
        .collect()
}
