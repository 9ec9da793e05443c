//! Chat entity definitions

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A chat room in the `chats` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "chatname")]
    pub chat_name: String,
    /// Owning user, fixed at creation.
    #[serde(rename = "chatcreatorid")]
    pub chat_creator_id: String,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub members: Vec<String>,
    /// Denormalized head count. Set to 1 at creation and not kept in step with `members`.
    #[serde(rename = "roommemberssize", default)]
    pub room_members_size: i64,
    /// Owner key matched by [`crate::Store::list_chats_for_user`]. Present only on
    /// documents written by other tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Chat {
    /// A new single-member room owned by `creator`.
    pub fn new_room(name: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            id: None,
            chat_name: name.into(),
            chat_creator_id: creator.into(),
            members: Vec::new(),
            room_members_size: 1,
            username: None,
        }
    }
}

/// Projection of a chat document down to its member list.
#[derive(Debug, Deserialize)]
pub(crate) struct MembersProjection {
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub members: Vec<String>,
}
