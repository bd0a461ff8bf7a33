pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemStore;
pub use sqlite::SqliteStore;

use gchat_types::models::{Chat, Message, NewMessage, User};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("username already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        // A UNIQUE violation on users.username is the schema catching a
        // registration race that the handler-level lookup missed.
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return StorageError::Conflict;
            }
        }
        StorageError::Backend(e.into())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence gateway. Handlers receive this as an injected capability
/// (`Arc<dyn Storage>`); production uses [`SqliteStore`], tests use
/// [`MemStore`]. Every call is atomic per statement; there is no
/// multi-statement transaction support.
pub trait Storage: Send + Sync {
    // -- Users --

    /// Insert a new user; the store assigns the id.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user_by_id(&self, id: i64) -> Result<()>;
    fn delete_user_by_username(&self, username: &str) -> Result<()>;

    // -- Chats --

    fn create_chat(&self, usernames: &[String]) -> Result<Chat>;
    fn get_chat_by_id(&self, id: i64) -> Result<Option<Chat>>;
    fn update_chat(&self, chat: &Chat) -> Result<()>;
    fn delete_chat_by_id(&self, id: i64) -> Result<()>;

    // -- Messages --

    /// Batch insert; assigned ids are returned in input order.
    fn create_messages(&self, messages: &[NewMessage]) -> Result<Vec<Message>>;
    /// Messages for a chat, ordered by timestamp descending.
    fn get_messages_by_chat_id(&self, chat_id: i64) -> Result<Vec<Message>>;
    fn delete_messages_by_chat_id(&self, chat_id: i64) -> Result<()>;
    fn delete_messages_by_author_name(&self, author_name: &str) -> Result<()>;
}
