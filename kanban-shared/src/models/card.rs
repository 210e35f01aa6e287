/// Card model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE cards (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     list_id BIGINT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
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
pub struct Card {
    pub id: i64,
    pub title: String,
    pub description: String,

    #[serde(rename = "list")]
    pub list_id: i64,

    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCard {
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "no_null_characters"))]
    pub description: String,

    #[serde(rename = "list", alias = "list_id")]
    pub list_id: i64,

    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCard {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(custom(function = "no_null_characters"))]
    pub description: Option<String>,

    #[serde(default, rename = "list", alias = "list_id", deserialize_with = "non_null")]
    pub list_id: Option<i64>,

    #[serde(default, deserialize_with = "non_null")]
    pub position: Option<i32>,
}

impl From<CreateCard> for UpdateCard {
    fn from(data: CreateCard) -> Self {
        Self {
            title: Some(data.title),
            description: Some(data.description),
            list_id: Some(data.list_id),
            position: Some(data.position),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardFilter {
    pub list_id: Option<i64>,
}

#[async_trait]
impl Resource for Card {
    const NAME: &'static str = "card";
    const PATH: &'static str = "cards";

    type Create = CreateCard;
    type Update = UpdateCard;
    type Filter = CardFilter;

    async fn list(pool: &PgPool, owner_id: i64, filter: CardFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            r#"
            SELECT c.id, c.title, c.description, c.list_id, c.position, c.created_at, c.updated_at
            FROM cards c
            JOIN lists l ON l.id = c.list_id
            JOIN boards b ON b.id = l.board_id
            JOIN projects p ON p.id = b.project_id
            WHERE p.owner_id = $1
              AND ($2::BIGINT IS NULL OR c.list_id = $2)
            ORDER BY c.id
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
        sqlx::query_as::<_, Card>(
            r#"
            SELECT c.id, c.title, c.description, c.list_id, c.position, c.created_at, c.updated_at
            FROM cards c
            JOIN lists l ON l.id = c.list_id
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

    async fn create(pool: &PgPool, owner_id: i64, data: CreateCard) -> Result<Self, AccessError> {
        require_parent_owner(pool, Parent::List(data.list_id), owner_id).await?;

        let card = sqlx::query_as::<_, Card>(
            r#"
            INSERT INTO cards (title, description, list_id, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, list_id, position, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.list_id)
        .bind(data.position)
        .fetch_one(pool)
        .await?;

        Ok(card)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateCard,
    ) -> Result<Option<Self>, AccessError> {
        let Some(current) = Self::find_for_owner(pool, id, owner_id).await? else {
            return Ok(None);
        };

        if let Some(list_id) = data.list_id.filter(|l| *l != current.list_id) {
            require_parent_owner(pool, Parent::List(list_id), owner_id).await?;
        }

        let card = sqlx::query_as::<_, Card>(
            r#"
            UPDATE cards
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                list_id = COALESCE($4, list_id),
                position = COALESCE($5, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, list_id, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.list_id)
        .bind(data.position)
        .fetch_optional(pool)
        .await?;

        Ok(card)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM cards c
            USING lists l, boards b, projects p
            WHERE c.id = $1 AND l.id = c.list_id AND b.id = l.board_id
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
