/// Comment model and database operations
///
/// The author is always the user who created the comment; any `user` in
/// the request body is ignored.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id BIGSERIAL PRIMARY KEY,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use super::resource::{no_null_characters, non_null, Resource};
use crate::auth::access::{require_parent_owner, AccessError, Parent};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,

    #[serde(rename = "task")]
    pub task_id: i64,

    /// Author
    #[serde(rename = "user")]
    pub user_id: i64,

    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComment {
    #[serde(rename = "task", alias = "task_id")]
    pub task_id: i64,

    #[validate(length(min = 1), custom(function = "no_null_characters"))]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateComment {
    #[serde(default, rename = "task", alias = "task_id", deserialize_with = "non_null")]
    pub task_id: Option<i64>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1), custom(function = "no_null_characters"))]
    pub text: Option<String>,
}

impl From<CreateComment> for UpdateComment {
    fn from(data: CreateComment) -> Self {
        Self {
            task_id: Some(data.task_id),
            text: Some(data.text),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFilter {
    pub task_id: Option<i64>,
}

#[async_trait]
impl Resource for Comment {
    const NAME: &'static str = "comment";
    const PATH: &'static str = "comments";

    type Create = CreateComment;
    type Update = UpdateComment;
    type Filter = CommentFilter;

    async fn list(
        pool: &PgPool,
        owner_id: i64,
        filter: CommentFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.task_id, c.user_id, c.text, c.created_at, c.updated_at
            FROM comments c
            JOIN tasks t ON t.id = c.task_id
            JOIN lists l ON l.id = t.list_id
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE p.owner_id = $1
              AND ($2::BIGINT IS NULL OR c.task_id = $2)
            ORDER BY c.id
            "#,
        )
        .bind(owner_id)
        .bind(filter.task_id)
        .fetch_all(pool)
        .await
    }

    async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.task_id, c.user_id, c.text, c.created_at, c.updated_at
            FROM comments c
            JOIN tasks t ON t.id = c.task_id
            JOIN lists l ON l.id = t.list_id
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE c.id = $1 AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    async fn create(pool: &PgPool, owner_id: i64, data: CreateComment) -> Result<Self, AccessError> {
        require_parent_owner(pool, Parent::Task(data.task_id), owner_id).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, text, created_at, updated_at
            "#,
        )
        .bind(data.task_id)
        .bind(owner_id)
        .bind(data.text)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateComment,
    ) -> Result<Option<Self>, AccessError> {
        let Some(current) = Self::find_for_owner(pool, id, owner_id).await? else {
            return Ok(None);
        };

        if let Some(task_id) = data.task_id.filter(|t| *t != current.task_id) {
            require_parent_owner(pool, Parent::Task(task_id), owner_id).await?;
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET task_id = COALESCE($2, task_id),
                text = COALESCE($3, text),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, task_id, user_id, text, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.task_id)
        .bind(data.text)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments c
            USING tasks t, lists l, boards b, projects p
            WHERE c.id = $1 AND t.id = c.task_id AND l.id = t.list_id
              AND b.id = l.board_id AND p.id = b.project_id AND p.owner_id = $2
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
    fn test_create_ignores_user_in_body() {
        let data: CreateComment =
            serde_json::from_str(r#"{"task": 3, "text": "LGTM", "user": 99}"#).unwrap();
        assert_eq!(data.task_id, 3);
        assert_eq!(data.text, "LGTM");
    }

    #[test]
    fn test_empty_text_rejected() {
        let data = CreateComment { task_id: 1, text: String::new() };
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_author_serialized_as_user() {
        let now = Utc::now();
        let comment = Comment {
            id: 1,
            task_id: 2,
            user_id: 3,
            text: "hi".to_string(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["task"], 2);
        assert_eq!(json["user"], 3);
    }
}
