use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 output string. Never the plaintext, never serialized to clients.
    pub password_hash: String,
    pub chat_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub text: String,
    pub author_name: String,
    /// Epoch seconds. Listings are ordered by this field, newest first.
    pub timestamp: i64,
}

/// A message before the store has assigned it an id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: i64,
    pub text: String,
    pub author_name: String,
    pub timestamp: i64,
}
