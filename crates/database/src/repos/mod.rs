//! Repository seams over the `users` and `chats` collections
//!
//! The store talks to these traits only. Production wiring uses the Mongo
//! implementations; tests and local tooling use the in-memory ones.

pub mod chat_repository;
pub mod memory_repository;
pub mod user_repository;

pub use chat_repository::MongoChatRepository;
pub use memory_repository::{MemoryChatRepository, MemoryUserRepository};
pub use user_repository::MongoUserRepository;

use crate::entities::{Chat, User};
use crate::types::DatabaseResult;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert one user document. No uniqueness is enforced.
    async fn insert(&self, user: &User) -> DatabaseResult<()>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// Fetch only the stored password hash of `username`.
    async fn find_password_hash(&self, username: &str) -> DatabaseResult<Option<String>>;

    /// Every user whose username is in `usernames`, in no particular order.
    async fn find_by_usernames(&self, usernames: &[String]) -> DatabaseResult<Vec<User>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Insert one chat document and return its generated id.
    async fn insert(&self, chat: &Chat) -> DatabaseResult<ObjectId>;

    /// Chats whose own `username` field equals `username`.
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Vec<Chat>>;

    /// The `members` field of chat `id`, or `None` when no such chat exists.
    async fn find_members(&self, id: &ObjectId) -> DatabaseResult<Option<Vec<String>>>;
}
