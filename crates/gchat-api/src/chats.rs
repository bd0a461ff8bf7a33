use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use gchat_types::api::{ChatResponse, CreateChatRequest};
use gchat_types::models::User;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn create_chat(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Json(req): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let chat = blocking(move || {
        let chat = store.create_chat(&req.usernames)?;

        // Membership lives on the user record; add the new chat to each
        // participant's list. Unknown usernames are skipped.
        for username in &chat.usernames {
            if let Some(mut user) = store.get_user_by_username(username)? {
                user.chat_ids.push(chat.id);
                store.update_user(&user)?;
            }
        }

        Ok(chat)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ChatResponse::from(chat))))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Path(chat_id): Path<i64>,
) -> Result<Json<ChatResponse>, ApiError> {
    let store = state.store.clone();
    let chat = blocking(move || Ok(store.get_chat_by_id(chat_id)?))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(chat.into()))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Path(chat_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    blocking(move || {
        let Some(chat) = store.get_chat_by_id(chat_id)? else {
            return Err(ApiError::NotFound);
        };

        store.delete_messages_by_chat_id(chat.id)?;
        store.delete_chat_by_id(chat.id)?;

        for username in &chat.usernames {
            if let Some(mut user) = store.get_user_by_username(username)? {
                user.chat_ids.retain(|id| *id != chat.id);
                store.update_user(&user)?;
            }
        }

        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
