/// Project model and database operations
///
/// Projects are the root of the kanban hierarchy. Each has exactly one
/// owner, assigned from the creating user and never taken from the request
/// body.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
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
use crate::auth::access::AccessError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,

    #[serde(rename = "owner")]
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 200), custom(function = "no_null_characters"))]
    pub name: Option<String>,
}

impl From<CreateProject> for UpdateProject {
    fn from(data: CreateProject) -> Self {
        Self { name: Some(data.name) }
    }
}

/// Projects have no list filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {}

#[async_trait]
impl Resource for Project {
    const NAME: &'static str = "project";
    const PATH: &'static str = "projects";

    type Create = CreateProject;
    type Update = UpdateProject;
    type Filter = ProjectFilter;

    async fn list(
        pool: &PgPool,
        owner_id: i64,
        _filter: ProjectFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM projects
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    async fn create(pool: &PgPool, owner_id: i64, data: CreateProject) -> Result<Self, AccessError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, AccessError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($3, name), updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.name)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
