/// CRUD endpoints shared by every kanban resource
///
/// One set of generic handlers serves all six collections. For a resource
/// with path `boards`:
///
/// ```text
/// GET    /boards/          list (filtered by query string)
/// POST   /boards/          create            -> 201
/// GET    /boards/:id/      retrieve
/// PUT    /boards/:id/      full replace
/// PATCH  /boards/:id/      partial update
/// DELETE /boards/:id/      delete            -> 204
/// ```
///
/// All of them require a signed-in user and only ever see rows owned by
/// that user. Rows owned by someone else answer 404, the same as rows that
/// do not exist.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::method_not_allowed,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use kanban_shared::{auth::middleware::AuthContext, models::Resource};
use tracing::{debug, info};
use validator::Validate;

/// Collection and member routes for `R`
pub fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/{}/", R::PATH);
    let member = format!("/{}/:id/", R::PATH);

    Router::new()
        .route(
            &collection,
            get(list::<R>).post(create::<R>).fallback(method_not_allowed),
        )
        .route(
            &member,
            get(retrieve::<R>)
                .put(replace::<R>)
                .patch(update::<R>)
                .delete(destroy::<R>)
                .fallback(method_not_allowed),
        )
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(filter): ApiQuery<R::Filter>,
) -> ApiResult<Json<Vec<R>>> {
    let rows = R::list(&state.db, auth.user_id, filter).await?;
    debug!(resource = R::NAME, count = rows.len(), "Listed resources");

    Ok(Json(rows))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(data): ApiJson<R::Create>,
) -> ApiResult<(StatusCode, Json<R>)> {
    data.validate()?;

    let row = R::create(&state.db, auth.user_id, data).await?;
    info!(resource = R::NAME, user_id = auth.user_id, "Created resource");

    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<R>> {
    R::find_for_owner(&state.db, id, auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// PUT: every writable field is required; omitted optional fields reset to defaults
pub async fn replace<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(data): ApiJson<R::Create>,
) -> ApiResult<Json<R>> {
    data.validate()?;
    apply_update::<R>(&state, id, auth.user_id, R::Update::from(data)).await
}

/// PATCH: only the fields present in the body change
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(data): ApiJson<R::Update>,
) -> ApiResult<Json<R>> {
    data.validate()?;
    apply_update::<R>(&state, id, auth.user_id, data).await
}

async fn apply_update<R: Resource>(
    state: &AppState,
    id: i64,
    user_id: i64,
    data: R::Update,
) -> ApiResult<Json<R>> {
    let row = R::update(&state.db, id, user_id, data)
        .await?
        .ok_or_else(ApiError::not_found)?;
    info!(resource = R::NAME, id, user_id, "Updated resource");

    Ok(Json(row))
}

pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if !R::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found());
    }
    info!(resource = R::NAME, id, user_id = auth.user_id, "Deleted resource");

    Ok(StatusCode::NO_CONTENT)
}
