/// Owner-scoped CRUD contract shared by the kanban entities
///
/// Every operation takes the id of the requesting user. Reads only return
/// rows whose ownership chain ends at that user, and writes that attach a
/// row to a parent first check the parent is owned by that user.
///
/// `Update` is a partial payload where every field is optional. A full
/// replacement is expressed by converting a `Create` payload into an
/// `Update`, so the two request shapes share one SQL path.

use async_trait::async_trait;
use serde::{
    de::{DeserializeOwned, Error as _},
    Deserialize, Deserializer, Serialize,
};
use sqlx::PgPool;
use validator::{Validate, ValidationError};

use crate::auth::access::AccessError;

#[async_trait]
pub trait Resource: Serialize + Send + Sync + Sized + 'static {
    /// Singular name, e.g. `"board"`
    const NAME: &'static str;

    /// Collection path segment, e.g. `"boards"`
    const PATH: &'static str;

    /// Payload for creation; also the shape of a full replacement
    type Create: DeserializeOwned + Validate + Send + 'static;

    /// Partial update payload
    type Update: DeserializeOwned + Validate + From<Self::Create> + Send + 'static;

    /// Query-string filter for listing
    type Filter: DeserializeOwned + Default + Send + 'static;

    /// Lists the rows visible to `owner_id`, ordered by id
    async fn list(pool: &PgPool, owner_id: i64, filter: Self::Filter)
        -> Result<Vec<Self>, sqlx::Error>;

    /// Fetches one row if it exists and is visible to `owner_id`
    async fn find_for_owner(pool: &PgPool, id: i64, owner_id: i64)
        -> Result<Option<Self>, sqlx::Error>;

    async fn create(pool: &PgPool, owner_id: i64, data: Self::Create) -> Result<Self, AccessError>;

    /// Applies the present fields; `None` if the row is not visible
    async fn update(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: Self::Update,
    ) -> Result<Option<Self>, AccessError>;

    /// Deletes a visible row (children cascade); false if not visible
    async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error>;
}

/// Keeps "field missing" and "field set to null" apart
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field: absent gives `None`, `null` gives `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserializes a field that may be omitted but not set to `null`
///
/// Use with `#[serde(default, deserialize_with = "non_null")]` on the
/// optional fields of an update payload whose column is `NOT NULL`.
pub fn non_null<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(D::Error::custom("This field may not be null.")),
    }
}

/// PostgreSQL text columns cannot store NUL
pub fn no_null_characters(value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        let mut error = ValidationError::new("null_characters");
        error.message = Some("Null characters are not allowed.".into());
        return Err(error);
    }
    Ok(())
}
