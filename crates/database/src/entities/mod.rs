//! Document shapes stored in the `users` and `chats` collections
//!
//! Field names are the lower-cased names existing deployments already wrote,
//! so documents inserted before this crate remain readable.

pub mod chat;
pub mod user;

pub use chat::Chat;
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Decode a sequence field that older inserts stored as BSON null.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
