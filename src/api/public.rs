//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::chat::SessionError;

// Errors

pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!("{}", msg),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        if self.status.is_server_error() {
            tracing::error!("{}", self.error);
            (
                self.status,
                format!("Something went wrong: {}", self.error),
            )
                .into_response()
        } else {
            tracing::warn!("{}", self.error);
            (self.status, self.error.to_string()).into_response()
        }
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`. Session
/// errors are the client's fault and keep a 4xx status.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = match error.downcast_ref::<SessionError>() {
            Some(SessionError::Busy) => StatusCode::CONFLICT,
            Some(SessionError::EmptyInput) => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_maps_session_errors_to_client_errors() {
        let busy: ApiError = SessionError::Busy.into();
        assert_eq!(busy.status, StatusCode::CONFLICT);

        let empty: ApiError = SessionError::EmptyInput.into();
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn it_maps_everything_else_to_server_errors() {
        let err: ApiError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn it_builds_not_found_errors() {
        let err = ApiError::not_found("missing");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
