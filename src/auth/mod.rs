//! Request identity
//!
//! Authentication itself is an external collaborator: an upstream
//! gateway verifies the caller and forwards the authenticated principal
//! in the `x-user-id` header. This module only extracts that principal;
//! it never validates credentials.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::error::AppError;

/// Header carrying the authenticated principal, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

fn extract_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Extractor for the current authenticated user id
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user_id): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract current user from request
    ///
    /// Rejects with 401 when the gateway header is absent or empty.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_user_id(&parts.headers)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
