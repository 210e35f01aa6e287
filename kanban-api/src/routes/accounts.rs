/// Account endpoints
///
/// # Endpoints
///
/// - `GET  /accounts/register/` - Usage hint
/// - `POST /accounts/register/` - Create a user
/// - `POST /accounts/login/` - Start a session (sets the `sessionid` cookie)
/// - `ANY  /accounts/logout/` - End the current session
/// - `ANY  /accounts/me/` - Describe the signed-in user
///
/// Bodies are parsed as JSON regardless of `Content-Type`. Fields that are
/// missing, empty or not strings count as absent.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail, NULL_CHARACTERS},
    routes::method_not_allowed,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use kanban_shared::{
    auth::{
        middleware::CurrentUser,
        password,
        session::{create_token, SessionClaims, SESSION_COOKIE},
    },
    models::{
        resource::no_null_characters,
        session::Session,
        user::{CreateUser, User, USERNAME_MAX_LENGTH},
    },
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Routes under `/accounts/`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/register/",
            get(register_info).post(register).fallback(method_not_allowed),
        )
        .route(
            "/accounts/login/",
            axum::routing::post(login).fallback(login_requires_post),
        )
        .route("/accounts/logout/", any(logout))
        .route("/accounts/me/", any(current_user))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,

    /// Same value as the cookie, for clients that send a bearer header
    pub token: String,
}

/// Username and password pulled from a request body
#[derive(Debug, PartialEq, Eq)]
struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn parse(body: &[u8]) -> ApiResult<Self> {
        let data: Value = serde_json::from_slice(body)
            .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let username = field("username");
        if username.as_deref().is_some_and(|u| no_null_characters(u).is_err()) {
            return Err(ApiError::BadRequest(NULL_CHARACTERS.to_string()));
        }

        Ok(Self {
            username,
            password: field("password"),
        })
    }
}

pub async fn register_info() -> Json<MessageResponse> {
    MessageResponse::new("Register API working. Use POST with username & password.")
}

/// Register a new user
///
/// # Errors
///
/// - `400`: Invalid JSON, missing field, username too long, or username taken
pub async fn register(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<MessageResponse>> {
    let Credentials {
        username: Some(username),
        password: Some(password),
    } = Credentials::parse(&body)?
    else {
        return Err(ApiError::BadRequest("Username and password required".to_string()));
    };

    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "username".to_string(),
            message: format!(
                "Ensure this field has no more than {} characters.",
                USERNAME_MAX_LENGTH
            ),
        }]));
    }

    if User::username_exists(&state.db, &username).await? {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&password)?;

    // A concurrent registration surfaces as a unique violation, mapped to the same message
    let user = User::create(&state.db, CreateUser { username, password_hash }).await?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok(MessageResponse::new("User registered successfully"))
}

/// Log in
///
/// On success opens a server-side session and returns its token both in
/// the body and as the `sessionid` cookie.
///
/// # Errors
///
/// - `400`: Invalid JSON
/// - `401`: Unknown user, wrong password, or missing field
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let credentials = Credentials::parse(&body)?;
    let (Some(username), Some(password)) = (credentials.username, credentials.password) else {
        return Err(invalid());
    };

    let Some(user) = User::find_by_username(&state.db, &username).await? else {
        warn!(%username, "Login attempt for unknown user");
        return Err(invalid());
    };

    if !password::verify_password(&password, &user.password_hash)? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    let ttl = state.session_ttl();
    let session = Session::create(&state.db, user.id, ttl).await?;
    let claims = SessionClaims::new(user.id, session.id, ttl);
    let token = create_token(&claims, state.session_secret())?;

    User::update_last_login(&state.db, user.id).await?;

    info!(user_id = user.id, session_id = %session.id, "User logged in");

    let cookie = session_cookie(&token, claims.remaining_seconds(), state.config.api.production)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
        }),
    )
        .into_response())
}

pub async fn login_requires_post() -> ApiError {
    ApiError::MethodNotAllowed("POST request required".to_string())
}

/// Log out
///
/// Ends the session the request was authenticated with, if any, and clears
/// the cookie. Never fails.
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Response {
    if let Some(auth) = current.0 {
        match Session::delete(&state.db, auth.session_id).await {
            Ok(_) => info!(user_id = auth.user_id, session_id = %auth.session_id, "User logged out"),
            Err(e) => warn!(session_id = %auth.session_id, "Failed to delete session: {}", e),
        }
    }

    let mut response = MessageResponse::new("Logged out").into_response();
    if let Ok(cookie) = session_cookie("", 0, state.config.api.production) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// Current user, or `{"user": null}` when anonymous
pub async fn current_user(current: CurrentUser) -> Json<Value> {
    match current.0 {
        Some(auth) => Json(json!({ "username": auth.username, "id": auth.user_id })),
        None => Json(json!({ "user": null })),
    }
}

/// Builds the `Set-Cookie` value for the session token
///
/// `max_age` of 0 expires the cookie immediately.
fn session_cookie(token: &str, max_age: i64, secure: bool) -> ApiResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let creds = Credentials::parse(br#"{"username": "alice", "password": "pw1"}"#).unwrap();
        assert_eq!(creds.username.as_deref(), Some("alice"));
        assert_eq!(creds.password.as_deref(), Some("pw1"));
    }

    #[test]
    fn test_parse_treats_empty_and_non_string_as_missing() {
        let creds = Credentials::parse(br#"{"username": "", "password": 5}"#).unwrap();
        assert_eq!(
            creds,
            Credentials {
                username: None,
                password: None
            }
        );

        let creds = Credentials::parse(b"[]").unwrap();
        assert!(creds.username.is_none());
    }

    #[test]
    fn test_parse_rejects_null_characters_in_username() {
        let err = Credentials::parse(br#"{"username": "n\u0000ul", "password": "pw1"}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Null characters are not allowed."));

        // Passwords are only ever hashed
        let creds = Credentials::parse(br#"{"username": "alice", "password": "p\u0000w"}"#).unwrap();
        assert_eq!(creds.password.as_deref(), Some("p\0w"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Credentials::parse(b"username=alice").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Invalid JSON"));
    }

    #[test]
    fn test_session_cookie() {
        let cookie = session_cookie("abc", 60, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "sessionid=abc; HttpOnly; Path=/; SameSite=Lax; Max-Age=60"
        );

        let secure = session_cookie("abc", 60, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));

        let cleared = session_cookie("", 0, false).unwrap();
        assert!(cleared.to_str().unwrap().starts_with("sessionid=;"));
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
