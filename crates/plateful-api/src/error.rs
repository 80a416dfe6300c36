use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use plateful_db::StoreError;

/// HTTP-facing error taxonomy. Store errors map onto it 1:1 except
/// for internal storage failures, which are logged and collapsed into
/// an opaque 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("invalid action '{0}', expected 'approve' or 'reject'")]
    InvalidAction(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidAction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Forbidden(why) => ApiError::Forbidden(why),
            StoreError::Conflict(why) => ApiError::Conflict(why),
            other => {
                error!("storage failure: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::NotFound("post"), StatusCode::NOT_FOUND),
            (StoreError::Forbidden("nope"), StatusCode::FORBIDDEN),
            (StoreError::Conflict("dup"), StatusCode::CONFLICT),
            (
                StoreError::Lock("poisoned".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (store, status) in cases {
            assert_eq!(ApiError::from(store).status(), status);
        }
    }

    #[test]
    fn internal_error_hides_details() {
        let err = ApiError::from(StoreError::Lock("poisoned".into()));
        assert_eq!(err.to_string(), "internal server error");
    }
}
