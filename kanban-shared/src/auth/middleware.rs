/// Session authentication middleware for Axum
///
/// Every request passes through [`session_middleware`], which looks for a
/// session token and resolves it to the user it belongs to. The outcome is
/// stored in request extensions as [`CurrentUser`]; requests without a usable
/// token continue as anonymous rather than being rejected here.
///
/// Handlers that need a signed-in user take [`AuthContext`] as an argument,
/// which rejects anonymous requests with 401. Handlers that behave
/// differently for anonymous callers take [`CurrentUser`] instead.
///
/// # Token sources
///
/// 1. `Authorization: Bearer <token>`
/// 2. `sessionid=<token>` cookie
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use kanban_shared::auth::middleware::{session_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn whoami(auth: AuthContext) -> String {
///     auth.username
/// }
///
/// fn router(pool: PgPool, secret: String) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .layer(middleware::from_fn(move |req, next| {
///             session_middleware(pool.clone(), secret.clone(), req, next)
///         }))
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::session::{validate_token, SESSION_COOKIE};
use crate::models::session::Session;

/// Signed-in user attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
    /// Session the request was authenticated with
    pub session_id: Uuid,
}

/// Result of session resolution, always present after [`session_middleware`]
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthContext>);

/// Error type for authentication
#[derive(Debug)]
pub enum AuthError {
    /// No signed-in user on a route that needs one
    NotAuthenticated,

    /// Session lookup failed
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication credentials were not provided." })),
            )
                .into_response(),
            AuthError::DatabaseError(msg) => {
                error!("Session lookup failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal error occurred" })),
                )
                    .into_response()
            }
        }
    }
}

/// Extracts the session token from the request headers
///
/// A bearer token wins over the cookie when both are sent.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolves request headers to the signed-in user, if any
///
/// Missing, malformed, expired and revoked tokens all yield `None`. Only a
/// failing database lookup is an error.
pub async fn resolve_current_user(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<Option<AuthContext>, AuthError> {
    let Some(token) = token_from_headers(headers) else {
        return Ok(None);
    };

    let claims = match validate_token(&token, secret) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Ignoring session token: {}", e);
            return Ok(None);
        }
    };

    let user = Session::find_active_user(pool, claims.sid, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(user.map(|(user_id, username)| AuthContext {
        user_id,
        username,
        session_id: claims.sid,
    }))
}

/// Session middleware
///
/// Inserts [`CurrentUser`] into the request extensions and never rejects a
/// request on authentication grounds.
pub async fn session_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let current = resolve_current_user(&pool, &secret, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(current));

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .ok_or(AuthError::NotAuthenticated)
    }
}
