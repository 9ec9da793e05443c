//! In-process repository implementations
//!
//! Queries use the same equality semantics as the Mongo repositories and, like
//! the real collections, enforce no uniqueness.

use super::{ChatRepository, UserRepository};
use crate::entities::{Chat, User};
use crate::types::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

fn check_available(unavailable: &AtomicBool) -> DatabaseResult<()> {
    if unavailable.load(Ordering::SeqCst) {
        return Err(DatabaseError::ConnectionFailure(
            "in-memory database marked unavailable".to_string(),
        ));
    }
    Ok(())
}

/// In-memory `users` collection.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the server were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored document, in insertion order.
    pub async fn documents(&self) -> Vec<User> {
        self.users.read().await.clone()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        check_available(&self.unavailable)?;
        let mut stored = user.clone();
        stored.id.get_or_insert_with(ObjectId::new);
        self.users.write().await.push(stored);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        check_available(&self.unavailable)?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_password_hash(&self, username: &str) -> DatabaseResult<Option<String>> {
        Ok(self
            .find_by_username(username)
            .await?
            .map(|user| user.password_hash))
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> DatabaseResult<Vec<User>> {
        check_available(&self.unavailable)?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| usernames.contains(&u.username))
            .cloned()
            .collect())
    }
}

/// In-memory `chats` collection.
#[derive(Clone, Default)]
pub struct MemoryChatRepository {
    chats: Arc<RwLock<Vec<Chat>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn documents(&self) -> Vec<Chat> {
        self.chats.read().await.clone()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn insert(&self, chat: &Chat) -> DatabaseResult<ObjectId> {
        check_available(&self.unavailable)?;
        let mut stored = chat.clone();
        let id = *stored.id.get_or_insert_with(ObjectId::new);
        self.chats.write().await.push(stored);
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Vec<Chat>> {
        check_available(&self.unavailable)?;
        let chats = self.chats.read().await;
        Ok(chats
            .iter()
            .filter(|c| c.username.as_deref() == Some(username))
            .cloned()
            .collect())
    }

    async fn find_members(&self, id: &ObjectId) -> DatabaseResult<Option<Vec<String>>> {
        check_available(&self.unavailable)?;
        let chats = self.chats.read().await;
        Ok(chats
            .iter()
            .find(|c| c.id.as_ref() == Some(id))
            .map(|c| c.members.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_insert_assigns_id_and_allows_duplicates() {
        let repo = MemoryUserRepository::new();
        let user = User::new("alice", "h", "a@example.com");

        repo.insert(&user).await.unwrap();
        repo.insert(&user).await.unwrap();

        let documents = repo.documents().await;
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|u| u.id.is_some()));
        assert_ne!(documents[0].id, documents[1].id);
    }

    #[tokio::test]
    async fn unavailable_repository_reports_connection_failure() {
        let repo = MemoryChatRepository::new();
        repo.set_unavailable(true);

        let error = repo.find_by_username("alice").await.unwrap_err();
        assert!(error.is_unavailable());

        repo.set_unavailable(false);
        assert!(repo.find_by_username("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_members_distinguishes_missing_chat_from_empty_room() {
        let repo = MemoryChatRepository::new();
        let id = repo.insert(&Chat::new_room("general", "u1")).await.unwrap();

        assert_eq!(repo.find_members(&id).await.unwrap(), Some(Vec::new()));
        assert_eq!(repo.find_members(&ObjectId::new()).await.unwrap(), None);
    }
}
