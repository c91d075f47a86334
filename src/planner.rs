//! Owner-scoped task operations: the query planner and the mutations.
//!
//! Every method trusts an already-resolved `owner_id`; mapping a caller to an
//! owner is the transport layer's job (see [`Planner::resolve_owner`] for the
//! lookup hook it uses).

use crate::db::{Database, TaskFieldUpdate};
use crate::errors::{AppError, AppResult};
use crate::hierarchy::assemble_forest;
use crate::models::{
    CreateTaskPayload, ListTasksFilters, RegisterUserPayload, TaskRecord, TaskTree,
    UpdateTaskPayload, UserRecord,
};
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use std::path::Path;

const TITLE_MAX_CHARS: usize = 200;
const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

static EMAIL_RE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)+$").expect("valid email regex")
});

pub struct Planner {
    db: Database,
}

impl Planner {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self {
            db: Database::new(path)?,
        })
    }

    /// Returns the owner's tasks as an assembled forest, newest-created
    /// first. With no filter every task is returned, completed ones included;
    /// callers wanting only active or only completed tasks pass a status
    /// filter explicitly.
    pub fn list_tasks(&self, owner_id: &str, filters: &ListTasksFilters) -> AppResult<Vec<TaskTree>> {
        let day = filters.day.as_deref().map(parse_day).transpose()?;
        let records = self.db.list_tasks(owner_id, filters.status, day)?;
        Ok(assemble_forest(records))
    }

    /// Creates a task or subtask. Returns the flat record; nesting is only
    /// materialized by [`Planner::list_tasks`].
    pub fn create_task(&self, owner_id: &str, payload: &CreateTaskPayload) -> AppResult<TaskRecord> {
        let title = validate_title(&payload.title)?;
        let time_estimate = payload.time_estimate.unwrap_or(0);

        let assigned_days = match payload.assigned_days.as_deref() {
            Some(days) if !days.is_empty() => days
                .iter()
                .map(|raw| parse_day(raw))
                .collect::<AppResult<Vec<NaiveDate>>>()?,
            _ => vec![Utc::now().date_naive()],
        };

        // Depth is capped at two levels: a subtask can only hang off a root.
        if let Some(parent_id) = payload.parent_id.as_deref() {
            let parent = self
                .db
                .get_task(owner_id, parent_id)?
                .ok_or_else(|| AppError::Validation("parent task not found".to_string()))?;
            if parent.parent_id.is_some() {
                return Err(AppError::Validation(
                    "cannot create a subtask under another subtask".to_string(),
                ));
            }
        }

        let task = self.db.insert_task(
            owner_id,
            &title,
            time_estimate,
            payload.parent_id.as_deref(),
            &assigned_days,
        )?;
        tracing::debug!(task_id = %task.id, parent_id = ?task.parent_id, "created task");
        Ok(task)
    }

    /// Applies the supplied fields to the owner's task. A nonexistent id and
    /// an id owned by someone else both come back as `NotFound`.
    pub fn update_task(
        &self,
        owner_id: &str,
        task_id: &str,
        payload: &UpdateTaskPayload,
    ) -> AppResult<TaskRecord> {
        let title = payload.title.as_deref().map(validate_title).transpose()?;

        let assigned_days = match payload.assigned_days.as_deref() {
            Some([]) => {
                return Err(AppError::Validation(
                    "assignedDays cannot be emptied".to_string(),
                ))
            }
            Some(days) => Some(
                days.iter()
                    .map(|raw| parse_day(raw))
                    .collect::<AppResult<Vec<NaiveDate>>>()?,
            ),
            None => None,
        };

        let fields = TaskFieldUpdate {
            title: title.as_deref(),
            status: payload.status,
            time_estimate: payload.time_estimate,
            assigned_days: assigned_days.as_deref(),
        };

        self.db
            .update_task_fields(owner_id, task_id, fields)?
            .ok_or_else(|| AppError::NotFound("task not found".to_string()))
    }

    /// Deletes the owner's task and, for a root, its subtasks. Children go
    /// first so a partial failure never leaves subtasks pointing at a missing
    /// parent.
    pub fn delete_task(&self, owner_id: &str, task_id: &str) -> AppResult<()> {
        let task = self
            .db
            .get_task(owner_id, task_id)?
            .ok_or_else(|| AppError::NotFound("task not found".to_string()))?;

        let cascaded = self.db.delete_tasks_with_parent(owner_id, &task.id)?;
        self.db.delete_task(owner_id, &task.id)?;
        tracing::debug!(task_id = %task.id, cascaded, "deleted task");
        Ok(())
    }

    /// Adds an entry to the user directory. No credentials are involved;
    /// authentication lives entirely outside this crate.
    pub fn register_user(&self, payload: &RegisterUserPayload) -> AppResult<UserRecord> {
        let name = payload.name.trim();
        let name_chars = name.chars().count();
        if name_chars < NAME_MIN_CHARS || name_chars > NAME_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
            )));
        }

        let email = payload.email.trim().to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return Err(AppError::Validation(
                "please provide a valid email address".to_string(),
            ));
        }

        if self.db.find_user_by_email(&email)?.is_some() {
            return Err(AppError::Validation("email is already in use".to_string()));
        }

        let user = self.db.insert_user(name, &email)?;
        tracing::debug!(user_id = %user.id, "registered user");
        Ok(user)
    }

    /// Maps an email to its directory entry, for the transport layer's
    /// identity resolution.
    pub fn resolve_owner(&self, email: &str) -> AppResult<UserRecord> {
        let email = email.trim().to_lowercase();
        self.db
            .find_user_by_email(&email)?
            .ok_or_else(|| AppError::NotFound("no account found with this email".to_string()))
    }
}

fn validate_title(raw: &str) -> AppResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn parse_day(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid day '{raw}', expected YYYY-MM-DD")))
}
