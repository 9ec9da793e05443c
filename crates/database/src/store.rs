//! The store: user registration, credential lookup, chat creation and
//! membership queries over the `users` and `chats` collections.
//!
//! Each operation performs one document operation (two for
//! [`Store::list_users_in_chat`]) and returns a typed result. No operation
//! retries, and none is transactional.

use crate::connection::DatabaseConnection;
use crate::entities::{Chat, User};
use crate::repos::{
    ChatRepository, MemoryChatRepository, MemoryUserRepository, MongoChatRepository,
    MongoUserRepository, UserRepository,
};
use crate::types::{DatabaseError, DatabaseResult};
use korero_config::DatabaseConfig;
use mongodb::bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared façade over the user and chat repositories.
///
/// Cloning is cheap; every clone talks to the same repositories and connection.
#[derive(Clone)]
pub struct Store {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    connection: Option<DatabaseConnection>,
}

impl Store {
    pub fn new(users: Arc<dyn UserRepository>, chats: Arc<dyn ChatRepository>) -> Self {
        Self {
            users,
            chats,
            connection: None,
        }
    }

    /// Open the process-wide connection and wire the Mongo repositories to it.
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let connection = DatabaseConnection::from_config(config).await?;
        Ok(Self::from_connection(connection))
    }

    /// Wire the Mongo repositories to an open connection. The store takes ownership
    /// of it and closes it in [`Store::shutdown`].
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(connection.users())),
            chats: Arc::new(MongoChatRepository::new(connection.chats())),
            connection: Some(connection),
        }
    }

    /// A store backed by fresh in-memory repositories.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryChatRepository::new()),
        )
    }

    /// Release the owned connection, if any.
    pub async fn shutdown(self) {
        if let Some(connection) = self.connection {
            connection.close().await;
        }
        info!("store shut down");
    }

    /// Insert a new user with an unconfirmed email and no chats.
    ///
    /// Username and email uniqueness is not checked here; callers run
    /// [`Store::is_email_taken`] first, and two concurrent registrations can
    /// still both succeed.
    pub async fn register(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> DatabaseResult<()> {
        debug!(username, "registering user");
        self.users
            .insert(&User::new(username, password_hash, email))
            .await
    }

    /// The password hash stored for `username`.
    ///
    /// A missing user is [`DatabaseError::NotFound`], never an empty hash.
    pub async fn get_password_hash(&self, username: &str) -> DatabaseResult<String> {
        debug!(username, "looking up password hash");
        match self.users.find_password_hash(username).await? {
            Some(hash) => Ok(hash),
            None => {
                warn!(username, "password hash requested for unknown user");
                Err(DatabaseError::NotFound(format!("user {username}")))
            }
        }
    }

    /// Whether `candidate` is unavailable for registration.
    ///
    /// The lookup is keyed on `username`, not `email`: with no user named
    /// `candidate` the result is `false`; otherwise it is `true` unless that
    /// user's email is also exactly `candidate`.
    pub async fn is_email_taken(&self, candidate: &str) -> DatabaseResult<bool> {
        debug!(candidate, "checking email availability");
        let taken = match self.users.find_by_username(candidate).await? {
            None => false,
            Some(user) => user.email != candidate,
        };
        Ok(taken)
    }

    /// Create a single-member room from `chat`'s name and creator.
    ///
    /// Any members or size supplied by the caller are discarded. Returns the
    /// document as stored, including its generated id.
    pub async fn create_chat(&self, chat: &Chat) -> DatabaseResult<Chat> {
        let mut room = Chat::new_room(chat.chat_name.clone(), chat.chat_creator_id.clone());
        if !chat.members.is_empty() || chat.room_members_size != 1 {
            debug!(
                supplied_members = chat.members.len(),
                supplied_size = chat.room_members_size,
                "discarding caller-supplied membership"
            );
        }

        let id = self.chats.insert(&room).await?;
        room.id = Some(id);
        debug!(chat_id = %id, creator = %room.chat_creator_id, "chat created");
        Ok(room)
    }

    /// Every chat whose stored `username` field equals `username`. Order is unspecified.
    pub async fn list_chats_for_user(&self, username: &str) -> DatabaseResult<Vec<Chat>> {
        let chats = self.chats.find_by_username(username).await?;
        debug!(username, count = chats.len(), "listed chats for user");
        Ok(chats)
    }

    /// The `members` identifiers recorded on chat `chat_id`.
    pub async fn list_chat_member_ids(&self, chat_id: &str) -> DatabaseResult<Vec<String>> {
        let id = parse_chat_id(chat_id)?;
        self.chats
            .find_members(&id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("chat {chat_id}")))
    }

    /// Resolve the members of chat `chat_id` to their user documents.
    ///
    /// Results follow the order of the chat's `members` field, each member once.
    /// Identifiers with no matching user are skipped.
    pub async fn list_users_in_chat(&self, chat_id: &str) -> DatabaseResult<Vec<User>> {
        let members = self.list_chat_member_ids(chat_id).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        // First document per username wins, matching the single-document lookups.
        let mut by_username: HashMap<String, User> = HashMap::new();
        for user in self.users.find_by_usernames(&members).await? {
            by_username.entry(user.username.clone()).or_insert(user);
        }

        let mut seen = HashSet::new();
        let mut users = Vec::with_capacity(members.len());
        for member in &members {
            if !seen.insert(member.as_str()) {
                continue;
            }
            match by_username.remove(member) {
                Some(user) => users.push(user),
                None => warn!(chat_id, member = %member, "chat member has no user record"),
            }
        }

        Ok(users)
    }
}

fn parse_chat_id(chat_id: &str) -> DatabaseResult<ObjectId> {
    ObjectId::parse_str(chat_id)
        .map_err(|_| DatabaseError::InvalidIdentifier(format!("chat id {chat_id:?}")))
}
