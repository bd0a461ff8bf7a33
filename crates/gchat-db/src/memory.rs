use std::sync::Mutex;

use anyhow::anyhow;

use gchat_types::models::{Chat, Message, NewMessage, User};

use crate::{Result, Storage, StorageError};

/// In-memory store for tests and local development. Same contract as
/// [`crate::SqliteStore`], including the username uniqueness rule.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
    next_user_id: i64,
    next_chat_id: i64,
    next_message_id: i64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Backend(anyhow!("store lock poisoned: {}", e)))
    }

    /// Test helper: total number of user records.
    pub fn user_count(&self) -> usize {
        self.inner.lock().map(|i| i.users.len()).unwrap_or(0)
    }

    /// Test helper: total number of message records.
    pub fn message_count(&self) -> usize {
        self.inner.lock().map(|i| i.messages.len()).unwrap_or(0)
    }
}

impl Storage for MemStore {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.username == username) {
            return Err(StorageError::Conflict);
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            chat_ids: vec![],
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    fn delete_user_by_id(&self, id: i64) -> Result<()> {
        self.lock()?.users.retain(|u| u.id != id);
        Ok(())
    }

    fn delete_user_by_username(&self, username: &str) -> Result<()> {
        self.lock()?.users.retain(|u| u.username != username);
        Ok(())
    }

    fn create_chat(&self, usernames: &[String]) -> Result<Chat> {
        let mut inner = self.lock()?;
        inner.next_chat_id += 1;
        let chat = Chat {
            id: inner.next_chat_id,
            usernames: usernames.to_vec(),
        };
        inner.chats.push(chat.clone());
        Ok(chat)
    }

    fn get_chat_by_id(&self, id: i64) -> Result<Option<Chat>> {
        Ok(self.lock()?.chats.iter().find(|c| c.id == id).cloned())
    }

    fn update_chat(&self, chat: &Chat) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.chats.iter_mut().find(|c| c.id == chat.id) {
            *existing = chat.clone();
        }
        Ok(())
    }

    fn delete_chat_by_id(&self, id: i64) -> Result<()> {
        self.lock()?.chats.retain(|c| c.id != id);
        Ok(())
    }

    fn create_messages(&self, messages: &[NewMessage]) -> Result<Vec<Message>> {
        let mut inner = self.lock()?;
        let mut out = Vec::with_capacity(messages.len());
        for msg in messages {
            inner.next_message_id += 1;
            let stored = Message {
                id: inner.next_message_id,
                chat_id: msg.chat_id,
                text: msg.text.clone(),
                author_name: msg.author_name.clone(),
                timestamp: msg.timestamp,
            };
            inner.messages.push(stored.clone());
            out.push(stored);
        }
        Ok(out)
    }

    fn get_messages_by_chat_id(&self, chat_id: i64) -> Result<Vec<Message>> {
        let mut msgs: Vec<Message> = self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        msgs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(msgs)
    }

    fn delete_messages_by_chat_id(&self, chat_id: i64) -> Result<()> {
        self.lock()?.messages.retain(|m| m.chat_id != chat_id);
        Ok(())
    }

    fn delete_messages_by_author_name(&self, author_name: &str) -> Result<()> {
        self.lock()?
            .messages
            .retain(|m| m.author_name != author_name);
        Ok(())
    }
}
