use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotActive,
    InProcess,
    Complete,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotActive => "not_active",
            Self::InProcess => "in_process",
            Self::Complete => "complete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "not_active" => Some(Self::NotActive),
            "in_process" => Some(Self::InProcess),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NotActive
    }
}

/// A task as persisted: flat, no nesting. Trees are produced only by the
/// hierarchy assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub status: TaskStatus,
    /// Estimated effort, in minutes.
    pub time_estimate: u32,
    /// `None` for a root task, the root's id for a subtask.
    pub parent_id: Option<String>,
    /// Calendar days the task is scheduled on. Non-empty.
    pub assigned_days: Vec<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A root task with its subtasks attached, as returned by `list_tasks`.
/// Subtasks are themselves `TaskTree`s with empty `subtasks` lists, so the
/// serialized shape is uniform at both levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub subtasks: Vec<TaskTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: String,
    pub time_estimate: Option<u32>,
    pub parent_id: Option<String>,
    /// `YYYY-MM-DD` strings; absent or empty means "today".
    pub assigned_days: Option<Vec<String>>,
}

/// Partial update: only supplied fields are applied. `assigned_days`, when
/// present, replaces the stored set outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub time_estimate: Option<u32>,
    pub assigned_days: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksFilters {
    /// `YYYY-MM-DD`; matches tasks with that day anywhere in `assigned_days`.
    pub day: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// Stored lowercased; unique across the directory.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    pub name: String,
    pub email: String,
}
