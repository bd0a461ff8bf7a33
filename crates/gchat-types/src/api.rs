use serde::{Deserialize, Serialize};

use crate::models::{Chat, Message, User};

// -- JWT Claims --

/// Session token claims shared between gchat-auth (issue/verify) and
/// gchat-api (middleware). `sub` carries the user id as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Auth --

/// Shared payload for register and login. The wire field is named
/// `passwordHashed` for compatibility with existing clients, but it
/// carries the plaintext password; hashing happens server-side.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: String,
    #[serde(rename = "passwordHashed")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub chat_ids: Vec<i64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            chat_ids: user.chat_ids,
        }
    }
}

// -- Chats --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChatRequest {
    pub usernames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: i64,
    pub usernames: Vec<String>,
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            usernames: chat.usernames,
        }
    }
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMessageRequest {
    pub text: String,
    /// Epoch seconds; defaults to the server clock when omitted.
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub chat_id: i64,
    pub text: String,
    pub author_name: String,
    pub timestamp: i64,
}

impl From<Message> for MessageResponse {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            chat_id: msg.chat_id,
            text: msg.text,
            author_name: msg.author_name,
            timestamp: msg.timestamp,
        }
    }
}
