use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use gchat_auth::token;

use crate::auth::{AppState, SESSION_COOKIE};
use crate::blocking;
use crate::error::ApiError;

/// Gate for protected routes: pull the session cookie, verify the
/// token, resolve the user, and hand the wrapped handler a `User` via
/// request extensions. Every failure collapses to 401; the specific
/// reason only reaches the logs.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;

    let claims = token::verify(&state.jwt_secret, cookie.value()).map_err(|e| {
        warn!("rejected session token: {}", e);
        ApiError::Unauthorized
    })?;

    let user_id: i64 = claims.sub.parse().map_err(|_| {
        warn!("session token carried a non-numeric user id: {:?}", claims.sub);
        ApiError::Unauthorized
    })?;

    let store = state.store.clone();
    let user = blocking(move || Ok(store.get_user_by_id(user_id)?))
        .await?
        .ok_or_else(|| {
            warn!("valid token for missing user id {}", user_id);
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
