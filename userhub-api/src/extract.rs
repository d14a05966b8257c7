/// Custom Axum extractors
///
/// - [`AppJson`]: `Json` whose rejection is an [`ApiError`] (JSON error body)
/// - [`UserId`]: the `:id` path segment as a user id

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};

/// JSON request body that rejects with [`ApiError::BadRequest`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// User id taken from the `:id` path segment
///
/// A segment that is not an integer cannot name a stored user, so it is
/// rejected as not found rather than as a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| user_not_found())?;

        parse_user_id(&raw).map(UserId).ok_or_else(user_not_found)
    }
}

fn parse_user_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub(crate) fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}
