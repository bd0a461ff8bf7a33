use std::path::Path;
use std::sync::Mutex;

use anyhow::anyhow;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use gchat_types::models::{Chat, Message, NewMessage, User};

use crate::{Result, Storage, StorageError, migrations};

/// SQLite-backed store. The connection sits behind a mutex; callers on
/// the async side are expected to reach this through `spawn_blocking`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Backend(anyhow!("DB lock poisoned: {}", e)))?;
        f(&conn)
    }
}

// chat_ids and usernames live in TEXT columns as JSON arrays; SQLite
// has no native array type.
fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Backend(e.into()))
}

fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| StorageError::Backend(e.into()))
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_user(raw: (i64, String, String, String)) -> Result<User> {
    let (id, username, password_hash, chat_ids) = raw;
    Ok(User {
        id,
        username,
        password_hash,
        chat_ids: decode_json(&chat_ids)?,
    })
}

impl Storage for SqliteStore {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, chat_ids) VALUES (?1, ?2, '[]')",
                params![username, password_hash],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                chat_ids: vec![],
            })
        })
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, chat_ids FROM users WHERE id = ?1",
                [id],
                row_to_user,
            )
            .optional()?
            .map(into_user)
            .transpose()
        })
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, chat_ids FROM users WHERE username = ?1",
                [username],
                row_to_user,
            )
            .optional()?
            .map(into_user)
            .transpose()
        })
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let chat_ids = encode_json(&user.chat_ids)?;
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, password_hash = ?2, chat_ids = ?3 WHERE id = ?4",
                params![user.username, user.password_hash, chat_ids, user.id],
            )?;
            Ok(())
        })
    }

    fn delete_user_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    fn delete_user_by_username(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(())
        })
    }

    fn create_chat(&self, usernames: &[String]) -> Result<Chat> {
        let encoded = encode_json(&usernames)?;
        self.with_conn(|conn| {
            conn.execute("INSERT INTO chats (usernames) VALUES (?1)", [&encoded])?;
            Ok(Chat {
                id: conn.last_insert_rowid(),
                usernames: usernames.to_vec(),
            })
        })
    }

    fn get_chat_by_id(&self, id: i64) -> Result<Option<Chat>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT usernames FROM chats WHERE id = ?1",
                [id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|raw| {
                Ok(Chat {
                    id,
                    usernames: decode_json(&raw)?,
                })
            })
            .transpose()
        })
    }

    fn update_chat(&self, chat: &Chat) -> Result<()> {
        let usernames = encode_json(&chat.usernames)?;
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE chats SET usernames = ?1 WHERE id = ?2",
                params![usernames, chat.id],
            )?;
            Ok(())
        })
    }

    fn delete_chat_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM chats WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    fn create_messages(&self, messages: &[NewMessage]) -> Result<Vec<Message>> {
        // One prepared statement executed per row under a single lock
        // hold. Each insert is still an independent statement (no
        // transaction), and last_insert_rowid keeps the returned ids in
        // input order.
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO messages (chat_id, text, author_name, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            let mut out = Vec::with_capacity(messages.len());
            for msg in messages {
                stmt.execute(params![msg.chat_id, msg.text, msg.author_name, msg.timestamp])?;
                out.push(Message {
                    id: conn.last_insert_rowid(),
                    chat_id: msg.chat_id,
                    text: msg.text.clone(),
                    author_name: msg.author_name.clone(),
                    timestamp: msg.timestamp,
                });
            }
            Ok(out)
        })
    }

    fn get_messages_by_chat_id(&self, chat_id: i64) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, text, author_name, timestamp
                 FROM messages WHERE chat_id = ?1
                 ORDER BY timestamp DESC",
            )?;

            let rows = stmt
                .query_map([chat_id], |row| {
                    Ok(Message {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        text: row.get(2)?,
                        author_name: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    fn delete_messages_by_chat_id(&self, chat_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE chat_id = ?1", [chat_id])?;
            Ok(())
        })
    }

    fn delete_messages_by_author_name(&self, author_name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM messages WHERE author_name = ?1",
                [author_name],
            )?;
            Ok(())
        })
    }
}
