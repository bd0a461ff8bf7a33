use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::warn;

use gchat_auth::{password, token};
use gchat_db::Storage;
use gchat_types::api::{CredentialsRequest, UserResponse};
use gchat_types::models::User;

use crate::blocking;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "accessToken";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Storage>,
    pub jwt_secret: String,
    pub cookie_domain: String,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let user = blocking(move || {
        if store.get_user_by_username(&req.username)?.is_some() {
            warn!("register rejected: username {} already exists", req.username);
            return Err(ApiError::Conflict);
        }

        // Argon2 is deliberately expensive; keep it off the async runtime.
        let hash = password::hash_password(&req.password)?;
        Ok(store.create_user(&req.username, &hash)?)
    })
    .await?;

    let token =
        token::issue(&state.jwt_secret, user.id).map_err(|e| ApiError::Internal(e.into()))?;
    let jar = jar.add(session_cookie(&state.cookie_domain, token));

    Ok((StatusCode::CREATED, jar, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let user = blocking(move || {
        let Some(user) = store.get_user_by_username(&req.username)? else {
            warn!("login rejected: unknown username {}", req.username);
            return Err(ApiError::UnknownUser);
        };

        if !password::verify_password(&user.password_hash, &req.password) {
            warn!("login rejected: wrong password for {}", req.username);
            return Err(ApiError::WrongPassword);
        }

        Ok(user)
    })
    .await?;

    let token =
        token::issue(&state.jwt_secret, user.id).map_err(|e| ApiError::Internal(e.into()))?;
    let jar = jar.add(session_cookie(&state.cookie_domain, token));

    Ok((StatusCode::OK, jar, Json(UserResponse::from(user))))
}

/// The identity the middleware resolved for this request.
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(user.into())
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    blocking(move || {
        store.delete_messages_by_author_name(&user.username)?;
        store.delete_user_by_id(user.id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn session_cookie(domain: &str, token: String) -> Cookie<'static> {
    // Same-site is left at the browser default, matching the original
    // cookie contract.
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .domain(domain.to_string())
        .max_age(time::Duration::days(token::TOKEN_LIFETIME_DAYS))
        .secure(true)
        .http_only(true)
        .build()
}
