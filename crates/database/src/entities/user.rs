//! User entity definitions

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A registered account in the `users` collection.
///
/// `password_hash` holds opaque credential material produced by the caller;
/// this crate never sees a plaintext password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    #[serde(rename = "passwordhash")]
    pub password_hash: String,
    pub email: String,
    #[serde(rename = "emailconfirmed", default)]
    pub email_confirmed: bool,
    /// Chat identifiers the user belongs to. Nothing writes this yet.
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub chats: Vec<String>,
}

impl User {
    /// A freshly registered user: unconfirmed email, no chats.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            username: username.into(),
            password_hash: password_hash.into(),
            email: email.into(),
            email_confirmed: false,
            chats: Vec::new(),
        }
    }
}

/// Projection of a user document down to its credential field.
#[derive(Debug, Deserialize)]
pub(crate) struct PasswordHashProjection {
    #[serde(rename = "passwordhash")]
    pub password_hash: String,
}
