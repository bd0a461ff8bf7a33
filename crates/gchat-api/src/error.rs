use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use gchat_db::StorageError;

/// Request-level error taxonomy. Client-visible messages are terser
/// than what goes to the logs; internal detail never reaches the body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("username is taken")]
    Conflict,
    #[error("unknown username")]
    UnknownUser,
    #[error("wrong password")]
    WrongPassword,
    #[error("not authorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict => ApiError::Conflict,
            StorageError::NotFound => ApiError::NotFound,
            StorageError::Backend(err) => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Conflict => (StatusCode::CONFLICT, "username is taken"),
            // Unknown username and wrong password stay distinct in the
            // logs but collapse to one opaque response, so login cannot
            // be used to enumerate accounts.
            ApiError::UnknownUser | ApiError::WrongPassword => {
                (StatusCode::UNAUTHORIZED, "invalid username or password")
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "not authorized"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found"),
            ApiError::Internal(err) => {
                error!("request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
