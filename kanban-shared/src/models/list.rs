/// List model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     position INTEGER NOT NULL DEFAULT 0,
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
pub struct List {
    pub id: i64,
    pub title: String,

    #[serde(rename = "board")]
    pub board_id: i64,

    /// Client-managed ordering hint
    pub position: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateList {
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub title: String,

    #[serde(rename = "board", alias = "board_id")]
    pub board_id: i64,

    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateList {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub title: Option<String>,

    #[serde(default, rename = "board", alias = "board_id", deserialize_with = "non_null")]
    pub board_id: Option<i64>,

    #[serde(default, deserialize_with = "non_null")]
    pub position: Option<i32>,
}

impl From<CreateList> for UpdateList {
    fn from(data: CreateList) -> Self {
        Self {
            title: Some(data.title),
            board_id: Some(data.board_id),
            position: Some(data.position),
        }
    }
}

/// `?board_id=` restricts the listing to one board
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub board_id: Option<i64>,
}

#[async_trait]
impl Resource for List {
    const NAME: &'static str = "list";
    const PATH: &'static str = "lists";

    type Create = CreateList;
    type Update = UpdateList;
    type Filter = ListFilter;

    async fn list(pool: &PgPool, owner_id: i64, filter: ListFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            r#"
            SELECT l.id, l.title, l.board_id, l.position, l.created_at, l.updated_at
            FROM lists l
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE p.owner_id = $1
              AND ($2::BIGINT IS NULL OR l.board_id = $2)
            ORDER BY l.id
            "#,
        )
        .bind(owner_id)
        .bind(filter.board_id)
        .fetch_all(pool)
        .await
    }

    async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            r#"
            SELECT l.id, l.title, l.board_id, l.position, l.created_at, l.updated_at
            FROM lists l
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE l.id = $1 AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    async fn create(pool: &PgPool, owner_id: i64, data: CreateList) -> Result<Self, AccessError> {
        require_parent_owner(pool, Parent::Board(data.board_id), owner_id).await?;

        let list = sqlx::query_as::<_, List>(
            r#"
            INSERT INTO lists (title, board_id, position)
            VALUES ($1, $2, $3)
            RETURNING id, title, board_id, position, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.board_id)
        .bind(data.position)
        .fetch_one(pool)
        .await?;

        Ok(list)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateList,
    ) -> Result<Option<Self>, AccessError> {
        let Some(current) = Self::find_for_owner(pool, id, owner_id).await? else {
            return Ok(None);
        };

        if let Some(board_id) = data.board_id.filter(|b| *b != current.board_id) {
            require_parent_owner(pool, Parent::Board(board_id), owner_id).await?;
        }

        let list = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists
            SET title = COALESCE($2, title),
                board_id = COALESCE($3, board_id),
                position = COALESCE($4, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, board_id, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.board_id)
        .bind(data.position)
        .fetch_optional(pool)
        .await?;

        Ok(list)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM lists l
            USING boards b, projects p
            WHERE l.id = $1 AND b.id = l.board_id AND p.id = b.project_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
