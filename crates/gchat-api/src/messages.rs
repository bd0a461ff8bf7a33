use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use gchat_types::api::{MessageResponse, NewMessageRequest};
use gchat_types::models::{NewMessage, User};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Batch insert. The author is always the authenticated user, not
/// whatever the payload claims.
pub async fn send_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Extension(user): Extension<User>,
    Json(req): Json<Vec<NewMessageRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let created = blocking(move || {
        if store.get_chat_by_id(chat_id)?.is_none() {
            return Err(ApiError::NotFound);
        }

        let now = chrono::Utc::now().timestamp();
        let batch: Vec<NewMessage> = req
            .into_iter()
            .map(|msg| NewMessage {
                chat_id,
                text: msg.text,
                author_name: user.username.clone(),
                timestamp: msg.timestamp.unwrap_or(now),
            })
            .collect();

        Ok(store.create_messages(&batch)?)
    })
    .await?;

    let body: Vec<MessageResponse> = created.into_iter().map(Into::into).collect();
    Ok((StatusCode::CREATED, Json(body)))
}

/// Messages for a chat, newest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Extension(_user): Extension<User>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let store = state.store.clone();
    let messages = blocking(move || {
        if store.get_chat_by_id(chat_id)?.is_none() {
            return Err(ApiError::NotFound);
        }
        Ok(store.get_messages_by_chat_id(chat_id)?)
    })
    .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

pub async fn delete_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Extension(_user): Extension<User>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    blocking(move || {
        if store.get_chat_by_id(chat_id)?.is_none() {
            return Err(ApiError::NotFound);
        }
        Ok(store.delete_messages_by_chat_id(chat_id)?)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
