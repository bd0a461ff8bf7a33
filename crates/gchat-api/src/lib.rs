pub mod auth;
pub mod chats;
pub mod error;
pub mod messages;
pub mod middleware;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

use anyhow::anyhow;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

/// Run storage or hashing work off the async runtime. Both argon2 and
/// the SQLite mutex are blocking.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow!("blocking task join error: {}", e)))?
}

/// The full API surface. Register and login are public; everything
/// else sits behind the session middleware.
pub fn routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login));

    let protected = Router::new()
        .route("/api/me", get(auth::me).delete(auth::delete_me))
        .route("/api/chats", post(chats::create_chat))
        .route(
            "/api/chats/{chat_id}",
            get(chats::get_chat).delete(chats::delete_chat),
        )
        .route(
            "/api/chats/{chat_id}/messages",
            get(messages::get_messages)
                .post(messages::send_messages)
                .delete(messages::delete_messages),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new().merge(public).merge(protected).with_state(state)
}
