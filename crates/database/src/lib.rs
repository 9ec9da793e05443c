//! Korero Database Crate
//!
//! Data access for the Korero chat backend: user registration, credential
//! lookup, chat creation and membership queries against a MongoDB database
//! holding the `users` and `chats` collections.
//!
//! ```no_run
//! use korero_database::Store;
//!
//! # async fn run() -> korero_database::DatabaseResult<()> {
//! let config = korero_config::load().expect("configuration");
//! let store = Store::connect(&config.database).await?;
//!
//! if !store.is_email_taken("alice@example.com").await? {
//!     store.register("alice", "$argon2id$...", "alice@example.com").await?;
//! }
//!
//! store.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod entities;
pub mod repos;
pub mod store;
pub mod types;

pub use connection::{DatabaseConnection, CHATS_COLLECTION, USERS_COLLECTION};
pub use entities::{Chat, User};
pub use repos::{
    ChatRepository, MemoryChatRepository, MemoryUserRepository, MongoChatRepository,
    MongoUserRepository, UserRepository,
};
pub use store::Store;
pub use types::{DatabaseError, DatabaseResult};

/// Re-export of the BSON id type used for chat and user documents.
pub use mongodb::bson::oid::ObjectId;
