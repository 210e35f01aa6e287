/// Task model and database operations
///
/// Tasks live in a list alongside cards and carry scheduling metadata: an
/// optional due date, a priority, and an optional assignee. Deleting the
/// assignee's account unassigns the task rather than deleting it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     list_id BIGINT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     due_date DATE,
///     priority task_priority NOT NULL DEFAULT 'low',
///     assigned_to BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanban_shared::models::task::{CreateTask, Priority, Task};
/// use kanban_shared::models::Resource;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64, list_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, user_id, CreateTask {
///     title: "Write release notes".to_string(),
///     description: String::new(),
///     list_id,
///     due_date: None,
///     priority: Priority::High,
///     assigned_to: Some(user_id),
/// }).await?;
///
/// assert_eq!(task.priority, Priority::High);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use super::resource::{double_option, no_null_characters, non_null, Resource};
use crate::auth::access::{require_parent_owner, AccessError, Parent};

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,

    #[serde(rename = "list")]
    pub list_id: i64,

    pub due_date: Option<NaiveDate>,
    pub priority: Priority,

    /// Assignee; cleared when that user is deleted
    pub assigned_to: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255), custom(function = "no_null_characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "no_null_characters"))]
    pub description: String,

    #[serde(rename = "list", alias = "list_id")]
    pub list_id: i64,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub assigned_to: Option<i64>,
}

/// Partial task update
///
/// `due_date` and `assigned_to` distinguish a missing field (keep) from an
/// explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 255), custom(function = "no_null_characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(custom(function = "no_null_characters"))]
    pub description: Option<String>,

    #[serde(default, rename = "list", alias = "list_id", deserialize_with = "non_null")]
    pub list_id: Option<i64>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "non_null")]
    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<i64>>,
}

impl From<CreateTask> for UpdateTask {
    fn from(data: CreateTask) -> Self {
        Self {
            title: Some(data.title),
            description: Some(data.description),
            list_id: Some(data.list_id),
            due_date: Some(data.due_date),
            priority: Some(data.priority),
            assigned_to: Some(data.assigned_to),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub list_id: Option<i64>,
}

#[async_trait]
impl Resource for Task {
    const NAME: &'static str = "task";
    const PATH: &'static str = "tasks";

    type Create = CreateTask;
    type Update = UpdateTask;
    type Filter = TaskFilter;

    async fn list(pool: &PgPool, owner_id: i64, filter: TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.list_id, t.due_date, t.priority,
                   t.assigned_to, t.created_at, t.updated_at
            FROM tasks t
            JOIN lists l ON l.id = t.list_id
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE p.owner_id = $1
              AND ($2::BIGINT IS NULL OR t.list_id = $2)
            ORDER BY t.id
            "#,
        )
        .bind(owner_id)
        .bind(filter.list_id)
        .fetch_all(pool)
        .await
    }

    async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.list_id, t.due_date, t.priority,
                   t.assigned_to, t.created_at, t.updated_at
            FROM tasks t
            JOIN lists l ON l.id = t.list_id
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE t.id = $1 AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    async fn create(pool: &PgPool, owner_id: i64, data: CreateTask) -> Result<Self, AccessError> {
        require_parent_owner(pool, Parent::List(data.list_id), owner_id).await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, list_id, due_date, priority, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, list_id, due_date, priority,
                      assigned_to, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.list_id)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.assigned_to)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, AccessError> {
        let Some(current) = Self::find_for_owner(pool, id, owner_id).await? else {
            return Ok(None);
        };

        if let Some(list_id) = data.list_id.filter(|l| *l != current.list_id) {
            require_parent_owner(pool, Parent::List(list_id), owner_id).await?;
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                list_id = COALESCE($4, list_id),
                due_date = CASE WHEN $5 THEN $6 ELSE due_date END,
                priority = COALESCE($7, priority),
                assigned_to = CASE WHEN $8 THEN $9 ELSE assigned_to END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, list_id, due_date, priority,
                      assigned_to, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.list_id)
        .bind(data.due_date.is_some())
        .bind(data.due_date.flatten())
        .bind(data.priority)
        .bind(data.assigned_to.is_some())
        .bind(data.assigned_to.flatten())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks t
            USING lists l, boards b, projects p
            WHERE t.id = $1 AND l.id = t.list_id AND b.id = l.board_id
              AND p.id = b.project_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
        assert_eq!(serde_json::from_str::<Priority>("\"high\"").unwrap(), Priority::High);
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn test_create_defaults() {
        let data: CreateTask = serde_json::from_str(r#"{"title": "Ship", "list": 1}"#).unwrap();
        assert_eq!(data.priority, Priority::Low);
        assert_eq!(data.description, "");
        assert!(data.due_date.is_none());
        assert!(data.assigned_to.is_none());
    }

    #[test]
    fn test_create_parses_due_date() {
        let data: CreateTask = serde_json::from_str(
            r#"{"title": "Ship", "list": 1, "due_date": "2025-03-31", "assigned_to": 4}"#,
        )
        .unwrap();
        assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(data.assigned_to, Some(4));
    }

    #[test]
    fn test_patch_null_clears_assignee() {
        let keep: UpdateTask = serde_json::from_str(r#"{"title": "Renamed"}"#).unwrap();
        assert_eq!(keep.assigned_to, None);
        assert_eq!(keep.due_date, None);

        let clear: UpdateTask = serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(clear.assigned_to, Some(None));
    }

    #[test]
    fn test_full_replace_clears_omitted_nullable_fields() {
        let data: CreateTask = serde_json::from_str(r#"{"title": "Ship", "list": 1}"#).unwrap();
        let update = UpdateTask::from(data);
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.assigned_to, Some(None));
        assert_eq!(update.priority, Some(Priority::Low));
    }

    #[test]
    fn test_patch_rejects_null_priority_and_title() {
        assert!(serde_json::from_str::<UpdateTask>(r#"{"priority": null}"#).is_err());
        assert!(serde_json::from_str::<UpdateTask>(r#"{"title": null}"#).is_err());
        assert!(serde_json::from_str::<UpdateTask>(r#"{"due_date": null}"#).is_ok());
    }

    #[test]
    fn test_null_characters_rejected() {
        let data: CreateTask =
            serde_json::from_str(r#"{"title": "Ship", "description": "a\u0000b", "list": 1}"#).unwrap();
        let errors = data.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));

        let patch: UpdateTask = serde_json::from_str(r#"{"title": "x\u0000"}"#).unwrap();
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_title_limit_is_255() {
        let mut data: CreateTask = serde_json::from_str(r#"{"title": "x", "list": 1}"#).unwrap();
        data.title = "x".repeat(255);
        assert!(data.validate().is_ok());
        data.title.push('x');
        assert!(data.validate().is_err());
    }
}
