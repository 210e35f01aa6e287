/// Board model and database operations
///
/// A board belongs to one project and is visible only to that project's
/// owner.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
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
pub struct Board {
    pub id: i64,
    pub name: String,

    #[serde(rename = "project")]
    pub project_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBoard {
    #[validate(length(min = 1, max = 100), custom(function = "no_null_characters"))]
    pub name: String,

    #[serde(rename = "project", alias = "project_id")]
    pub project_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBoard {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 100), custom(function = "no_null_characters"))]
    pub name: Option<String>,

    #[serde(default, rename = "project", alias = "project_id", deserialize_with = "non_null")]
    pub project_id: Option<i64>,
}

impl From<CreateBoard> for UpdateBoard {
    fn from(data: CreateBoard) -> Self {
        Self {
            name: Some(data.name),
            project_id: Some(data.project_id),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardFilter {
    pub project_id: Option<i64>,
}

#[async_trait]
impl Resource for Board {
    const NAME: &'static str = "board";
    const PATH: &'static str = "boards";

    type Create = CreateBoard;
    type Update = UpdateBoard;
    type Filter = BoardFilter;

    async fn list(pool: &PgPool, owner_id: i64, filter: BoardFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.name, b.project_id, b.created_at, b.updated_at
            FROM boards b
            JOIN projects p ON p.id = b.project_id
            WHERE p.owner_id = $1
              AND ($2::BIGINT IS NULL OR b.project_id = $2)
            ORDER BY b.id
            "#,
        )
        .bind(owner_id)
        .bind(filter.project_id)
        .fetch_all(pool)
        .await
    }

    async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.name, b.project_id, b.created_at, b.updated_at
            FROM boards b
            JOIN projects p ON p.id = b.project_id
            WHERE b.id = $1 AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    async fn create(pool: &PgPool, owner_id: i64, data: CreateBoard) -> Result<Self, AccessError> {
        require_parent_owner(pool, Parent::Project(data.project_id), owner_id).await?;

        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (name, project_id)
            VALUES ($1, $2)
            RETURNING id, name, project_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.project_id)
        .fetch_one(pool)
        .await?;

        Ok(board)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateBoard,
    ) -> Result<Option<Self>, AccessError> {
        let Some(current) = Self::find_for_owner(pool, id, owner_id).await? else {
            return Ok(None);
        };

        if let Some(project_id) = data.project_id.filter(|p| *p != current.project_id) {
            require_parent_owner(pool, Parent::Project(project_id), owner_id).await?;
        }

        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET name = COALESCE($2, name),
                project_id = COALESCE($3, project_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, project_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.project_id)
        .fetch_optional(pool)
        .await?;

        Ok(board)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM boards b
            USING projects p
            WHERE b.id = $1 AND p.id = b.project_id AND p.owner_id = $2
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
    fn test_create_accepts_project_or_project_id() {
        let a: CreateBoard = serde_json::from_str(r#"{"name": "Sprint", "project": 3}"#).unwrap();
        let b: CreateBoard = serde_json::from_str(r#"{"name": "Sprint", "project_id": 3}"#).unwrap();
        assert_eq!(a.project_id, 3);
        assert_eq!(b.project_id, 3);
    }

    #[test]
    fn test_create_requires_project() {
        assert!(serde_json::from_str::<CreateBoard>(r#"{"name": "Sprint"}"#).is_err());
    }

    #[test]
    fn test_name_limit_is_100() {
        let ok = CreateBoard { name: "b".repeat(100), project_id: 1 };
        let too_long = CreateBoard { name: "b".repeat(101), project_id: 1 };
        assert!(ok.validate().is_ok());
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_full_replace_sets_every_field() {
        let update = UpdateBoard::from(CreateBoard { name: "Done".to_string(), project_id: 2 });
        assert_eq!(update.name.as_deref(), Some("Done"));
        assert_eq!(update.project_id, Some(2));
    }

    #[test]
    fn test_filter_from_query() {
        let filter: BoardFilter = serde_json::from_str(r#"{"project_id": 8}"#).unwrap();
        assert_eq!(filter.project_id, Some(8));
        assert_eq!(BoardFilter::default().project_id, None);
    }
}
