/// Extractors whose rejections use the API error format
///
/// Axum's built-in `Json`, `Path` and `Query` reject with plain-text
/// bodies. These wrappers run the same extraction and convert failures into
/// [`ApiError`](crate::error::ApiError), so a malformed body yields
/// `{"error": "Invalid JSON"}` with status 400.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
