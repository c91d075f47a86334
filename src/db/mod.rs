use crate::errors::{AppError, AppResult};
use crate::models::{TaskRecord, TaskStatus, UserRecord};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const TASK_COLUMNS: &str =
    "id, owner_id, title, status, time_estimate, parent_id, assigned_days_json, created_at, updated_at";

/// SQLite-backed task store. Implements the find/insert/update/delete contract
/// the planner builds on; all queries are scoped by `owner_id`.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

/// Parsed field updates for a partial task update. `None` fields are left
/// untouched in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFieldUpdate<'a> {
    pub title: Option<&'a str>,
    pub status: Option<TaskStatus>,
    pub time_estimate: Option<u32>,
    pub assigned_days: Option<&'a [NaiveDate]>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("database mutex poisoned".to_string()))
    }

    pub fn insert_task(
        &self,
        owner_id: &str,
        title: &str,
        time_estimate: u32,
        parent_id: Option<&str>,
        assigned_days: &[NaiveDate],
    ) -> AppResult<TaskRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let days_json = serde_json::to_string(assigned_days)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (id, owner_id, title, status, time_estimate, parent_id, assigned_days_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                owner_id,
                title,
                TaskStatus::NotActive.as_str(),
                i64::from(time_estimate),
                parent_id,
                days_json,
                now.to_rfc3339(),
            ],
        )?;

        Ok(TaskRecord {
            id,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            status: TaskStatus::NotActive,
            time_estimate,
            parent_id: parent_id.map(ToString::to_string),
            assigned_days: assigned_days.to_vec(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Flat filtered find, newest-created first. The `day` filter matches
    /// tasks whose assigned-day set contains that calendar day.
    pub fn list_tasks(
        &self,
        owner_id: &str,
        status: Option<TaskStatus>,
        day: Option<NaiveDate>,
    ) -> AppResult<Vec<TaskRecord>> {
        let mut query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?");
        let mut params_vec: Vec<String> = vec![owner_id.to_string()];

        if let Some(status) = status {
            query.push_str(" AND status = ?");
            params_vec.push(status.as_str().to_string());
        }
        if let Some(day) = day {
            query.push_str(
                " AND EXISTS (SELECT 1 FROM json_each(tasks.assigned_days_json) WHERE json_each.value = ?)",
            );
            params_vec.push(day.format("%Y-%m-%d").to_string());
        }

        query.push_str(" ORDER BY created_at DESC, rowid DESC");

        let conn = self.lock()?;
        let mut statement = conn.prepare(&query)?;
        let dyn_params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|param| param as &dyn rusqlite::ToSql)
            .collect();

        let rows = statement.query_map(rusqlite::params_from_iter(dyn_params), parse_task_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_task(&self, owner_id: &str, task_id: &str) -> AppResult<Option<TaskRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner_id = ?2"),
            [task_id, owner_id],
            parse_task_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Applies the supplied fields and bumps `updated_at`. Returns the updated
    /// record, or `None` when no row matches the id/owner pair.
    pub fn update_task_fields(
        &self,
        owner_id: &str,
        task_id: &str,
        fields: TaskFieldUpdate<'_>,
    ) -> AppResult<Option<TaskRecord>> {
        let now = Utc::now();
        let mut sets: Vec<&str> = vec!["updated_at = ?"];
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now.to_rfc3339())];

        if let Some(title) = fields.title {
            sets.push("title = ?");
            params_vec.push(Box::new(title.to_string()));
        }
        if let Some(status) = fields.status {
            sets.push("status = ?");
            params_vec.push(Box::new(status.as_str().to_string()));
        }
        if let Some(estimate) = fields.time_estimate {
            sets.push("time_estimate = ?");
            params_vec.push(Box::new(i64::from(estimate)));
        }
        if let Some(days) = fields.assigned_days {
            sets.push("assigned_days_json = ?");
            params_vec.push(Box::new(serde_json::to_string(days)?));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = ? AND owner_id = ?",
            sets.join(", ")
        );
        params_vec.push(Box::new(task_id.to_string()));
        params_vec.push(Box::new(owner_id.to_string()));

        let affected = {
            let conn = self.lock()?;
            let dyn_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|param| param.as_ref()).collect();
            conn.execute(&query, rusqlite::params_from_iter(dyn_params))?
        };

        if affected == 0 {
            return Ok(None);
        }
        self.get_task(owner_id, task_id)
    }

    /// Deletes every task whose `parent_id` equals `parent_id`, returning the
    /// number removed. Used for the one-level cascade, children before parent.
    pub fn delete_tasks_with_parent(&self, owner_id: &str, parent_id: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE owner_id = ?1 AND parent_id = ?2",
            [owner_id, parent_id],
        )?;
        Ok(deleted)
    }

    pub fn delete_task(&self, owner_id: &str, task_id: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            [task_id, owner_id],
        )?;
        Ok(deleted)
    }

    pub fn insert_user(&self, name: &str, email: &str) -> AppResult<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, email, now.to_rfc3339()],
        )?;

        Ok(UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, email, created_at FROM users WHERE email = ?1",
            [email],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_time(&row.get::<_, String>(3)?)?,
                })
            },
        )
        .optional()
        .map_err(AppError::from)
    }
}

fn parse_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    let status_raw: String = row.get(3)?;
    let status = TaskStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown task status '{status_raw}'"),
            )),
        )
    })?;
    let estimate: i64 = row.get(4)?;

    Ok(TaskRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        status,
        time_estimate: estimate.try_into().unwrap_or(0),
        parent_id: row.get(5)?,
        assigned_days: parse_days(&row.get::<_, String>(6)?)?,
        created_at: parse_time(&row.get::<_, String>(7)?)?,
        updated_at: parse_time(&row.get::<_, String>(8)?)?,
    })
}

fn parse_days(raw: &str) -> rusqlite::Result<Vec<NaiveDate>> {
    serde_json::from_str(raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                error.to_string(),
            )),
        )
    })
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    error.to_string(),
                )),
            )
        })
}
