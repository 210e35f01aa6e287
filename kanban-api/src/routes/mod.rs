/// API route handlers
///
/// - `health`: Health check endpoint
/// - `accounts`: Register, login, logout, current user
/// - `resources`: Generic CRUD for projects, boards, lists, cards, tasks and comments

pub mod accounts;
pub mod health;
pub mod resources;

use crate::error::ApiError;

/// Fallback for unsupported verbs on a known path
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}

/// Fallback for unknown paths
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
