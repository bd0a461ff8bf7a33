use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use gchat_types::api::Claims;

/// Tokens are valid for 30 days from issuance. There is no server-side
/// revocation; expiry is the only thing that ends a session.
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed claims")]
    MalformedClaims,
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,
    #[error("token expired")]
    Expired,
    #[error("token signing failed")]
    Signing,
}

/// Mint an HS256 session token binding `user_id`. The secret is passed
/// in explicitly; nothing here reads ambient state.
pub fn issue(secret: &str, user_id: i64) -> Result<String, TokenError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Signing)
}

/// Validate a session token and return its claims. Only HS256 is
/// accepted; a token whose header claims any other algorithm fails with
/// `UnsupportedAlgorithm` regardless of its signature.
pub fn verify(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::UnsupportedAlgorithm
        }
        _ => TokenError::MalformedClaims,
    })
}
