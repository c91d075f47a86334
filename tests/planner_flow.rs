use dayboard::models::{CreateTaskPayload, ListTasksFilters, TaskStatus, UpdateTaskPayload};
use dayboard::Planner;

const OWNER: &str = "owner-1";
const OTHER_OWNER: &str = "owner-2";

fn open_planner(dir: &tempfile::TempDir) -> Planner {
    Planner::open(&dir.path().join("planner.db")).expect("planner")
}

fn payload(title: &str, days: &[&str]) -> CreateTaskPayload {
    CreateTaskPayload {
        title: title.to_string(),
        time_estimate: Some(30),
        parent_id: None,
        assigned_days: Some(days.iter().map(ToString::to_string).collect()),
    }
}

fn subtask_payload(title: &str, parent_id: &str, days: &[&str]) -> CreateTaskPayload {
    CreateTaskPayload {
        parent_id: Some(parent_id.to_string()),
        ..payload(title, days)
    }
}

fn day_filter(day: &str) -> ListTasksFilters {
    ListTasksFilters {
        day: Some(day.to_string()),
        status: None,
    }
}

fn status_filter(status: TaskStatus) -> ListTasksFilters {
    ListTasksFilters {
        day: None,
        status: Some(status),
    }
}

#[test]
fn unfiltered_list_returns_forest_newest_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let first = planner
        .create_task(OWNER, &payload("First root", &["2024-03-01"]))
        .expect("create first");
    let sub = planner
        .create_task(OWNER, &subtask_payload("Subtask", &first.id, &["2024-03-01"]))
        .expect("create subtask");
    let second = planner
        .create_task(OWNER, &payload("Second root", &["2024-03-02"]))
        .expect("create second");

    let forest = planner
        .list_tasks(OWNER, &ListTasksFilters::default())
        .expect("list");

    // Newest-created root first; the subtask hangs off its root, not the top level.
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].task.id, second.id);
    assert_eq!(forest[1].task.id, first.id);
    assert_eq!(forest[1].subtasks.len(), 1);
    assert_eq!(forest[1].subtasks[0].task.id, sub.id);
    assert_eq!(forest[1].subtasks[0].task.parent_id.as_deref(), Some(first.id.as_str()));
}

#[test]
fn day_filter_is_existential_over_assigned_days() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    planner
        .create_task(OWNER, &payload("Spread", &["2024-03-01", "2024-03-05"]))
        .expect("create");

    for hit in ["2024-03-01", "2024-03-05"] {
        let forest = planner.list_tasks(OWNER, &day_filter(hit)).expect("list");
        assert_eq!(forest.len(), 1, "expected a match for {hit}");
    }
    let forest = planner
        .list_tasks(OWNER, &day_filter("2024-03-02"))
        .expect("list");
    assert!(forest.is_empty());
}

#[test]
fn day_filter_that_excludes_the_parent_drops_the_subtask() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let root = planner
        .create_task(OWNER, &payload("Root", &["2024-03-01"]))
        .expect("create root");
    planner
        .create_task(OWNER, &subtask_payload("Stray child", &root.id, &["2024-03-02"]))
        .expect("create subtask");

    // The child's day matches but its parent's does not: the child is neither
    // promoted to root nor attached anywhere.
    let forest = planner
        .list_tasks(OWNER, &day_filter("2024-03-02"))
        .expect("list");
    assert!(forest.is_empty());
}

#[test]
fn status_filter_is_exact_and_unfiltered_includes_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let done = planner
        .create_task(OWNER, &payload("Done", &["2024-03-01"]))
        .expect("create");
    planner
        .update_task(
            OWNER,
            &done.id,
            &UpdateTaskPayload {
                status: Some(TaskStatus::Complete),
                ..Default::default()
            },
        )
        .expect("complete");
    planner
        .create_task(OWNER, &payload("Pending", &["2024-03-01"]))
        .expect("create");

    let complete = planner
        .list_tasks(OWNER, &status_filter(TaskStatus::Complete))
        .expect("list complete");
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].task.id, done.id);

    let in_process = planner
        .list_tasks(OWNER, &status_filter(TaskStatus::InProcess))
        .expect("list in_process");
    assert!(in_process.is_empty());

    let all = planner
        .list_tasks(OWNER, &ListTasksFilters::default())
        .expect("list all");
    assert_eq!(all.len(), 2);
}

#[test]
fn partial_update_is_idempotent_on_unspecified_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let task = planner
        .create_task(OWNER, &payload("Stable", &["2024-03-01"]))
        .expect("create");

    let status_only = UpdateTaskPayload {
        status: Some(TaskStatus::InProcess),
        ..Default::default()
    };
    let once = planner
        .update_task(OWNER, &task.id, &status_only)
        .expect("first update");
    let twice = planner
        .update_task(OWNER, &task.id, &status_only)
        .expect("second update");

    for updated in [&once, &twice] {
        assert_eq!(updated.status, TaskStatus::InProcess);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.time_estimate, task.time_estimate);
        assert_eq!(updated.assigned_days, task.assigned_days);
    }
}

#[test]
fn deleting_a_root_cascades_to_its_subtasks_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let root = planner
        .create_task(OWNER, &payload("Doomed root", &["2024-03-01"]))
        .expect("create root");
    planner
        .create_task(OWNER, &subtask_payload("Child A", &root.id, &["2024-03-01"]))
        .expect("create child a");
    planner
        .create_task(OWNER, &subtask_payload("Child B", &root.id, &["2024-03-01"]))
        .expect("create child b");
    let survivor = planner
        .create_task(OWNER, &payload("Survivor", &["2024-03-01"]))
        .expect("create survivor");

    planner.delete_task(OWNER, &root.id).expect("delete root");

    let forest = planner
        .list_tasks(OWNER, &ListTasksFilters::default())
        .expect("list");
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].task.id, survivor.id);
    assert!(forest[0].subtasks.is_empty());
}

#[test]
fn deleting_a_subtask_does_not_touch_the_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    let root = planner
        .create_task(OWNER, &payload("Root", &["2024-03-01"]))
        .expect("create root");
    let sub = planner
        .create_task(OWNER, &subtask_payload("Child", &root.id, &["2024-03-01"]))
        .expect("create child");

    planner.delete_task(OWNER, &sub.id).expect("delete subtask");

    let forest = planner
        .list_tasks(OWNER, &ListTasksFilters::default())
        .expect("list");
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].task.id, root.id);
    assert!(forest[0].subtasks.is_empty());
}

#[test]
fn owners_never_see_each_others_tasks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let planner = open_planner(&dir);

    planner
        .create_task(OWNER, &payload("Mine", &["2024-03-01"]))
        .expect("create mine");
    let theirs = planner
        .create_task(OTHER_OWNER, &payload("Theirs", &["2024-03-01"]))
        .expect("create theirs");

    let forest = planner
        .list_tasks(OWNER, &ListTasksFilters::default())
        .expect("list");
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].task.title, "Mine");

    // Mutating the other owner's task reads as not-found, same as a bogus id.
    assert!(planner.delete_task(OWNER, &theirs.id).is_err());
    let still_there = planner
        .list_tasks(OTHER_OWNER, &ListTasksFilters::default())
        .expect("list other");
    assert_eq!(still_there.len(), 1);
}
