/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, so every failure is turned into
/// a JSON error body at the handler boundary. The readable message goes under
/// `error` and a stable machine code under `code`:
///
/// ```json
/// { "error": "User not found", "code": "not_found" }
/// ```
///
/// Database errors are logged server-side and never echoed to the client.
///
/// # Example
///
/// ```
/// use userhub_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("User not found".to_string()))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. a body that is not valid JSON
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// A database call failed while performing `operation` (500)
    ///
    /// The client sees `"Failed to <operation>"`; `source` is only logged.
    Persistence {
        operation: &'static str,
        source: sqlx::Error,
    },
}

impl ApiError {
    /// Adapter for `map_err` that tags a database error with the operation
    ///
    /// ```
    /// # use userhub_api::error::ApiError;
    /// let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
    /// let api_err = err.map_err(ApiError::persistence("create user")).unwrap_err();
    /// assert!(api_err.to_string().starts_with("Failed to create user: "));
    /// ```
    pub fn persistence(operation: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
        move |source| ApiError::Persistence { operation, source }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Error code (e.g., "bad_request", "not_found")
    pub code: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Persistence { operation, source } => {
                write!(f, "Failed to {}: {}", operation, source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Persistence { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Persistence { operation, source } => {
                // Log the database error but don't expose details to clients
                tracing::error!(operation, error = %source, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    format!("Failed to {}", operation),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: error_code.to_string(),
        });

        (status, body).into_response()
    }
}

/// Convert JSON body rejections to 400s
///
/// Covers syntax errors, a missing JSON content type, and well-formed JSON
/// whose values do not fit the request type (e.g. `{"name": 5}`).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = ApiError::NotFound("User not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "User not found");
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn test_persistence_response_hides_details() {
        let err = ApiError::Persistence {
            operation: "retrieve users",
            source: sqlx::Error::Protocol("relation \"users\" does not exist".into()),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to retrieve users");
        assert_eq!(body["code"], "internal_error");
        assert!(!body.to_string().contains("relation"));
    }

    #[test]
    fn test_persistence_source_is_exposed() {
        use std::error::Error as _;

        let err = ApiError::persistence("delete user")(sqlx::Error::RowNotFound);
        assert!(err.source().is_some());
    }
}
