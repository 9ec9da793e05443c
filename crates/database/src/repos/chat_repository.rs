//! Chat repository backed by the `chats` collection.

use super::ChatRepository;
use crate::entities::chat::MembersProjection;
use crate::entities::Chat;
use crate::types::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::bson::oid::ObjectId;
use mongodb::Collection;
use tracing::error;

#[derive(Clone)]
pub struct MongoChatRepository {
    collection: Collection<Chat>,
}

impl MongoChatRepository {
    pub fn new(collection: Collection<Chat>) -> Self {
        Self { collection }
    }
}

fn owner_filter(username: &str) -> Document {
    doc! { "username": username }
}

fn chat_id_filter(id: &ObjectId) -> Document {
    doc! { "_id": *id }
}

fn members_projection() -> Document {
    doc! { "_id": 0, "members": 1 }
}

#[async_trait]
impl ChatRepository for MongoChatRepository {
    async fn insert(&self, chat: &Chat) -> DatabaseResult<ObjectId> {
        let result = self.collection.insert_one(chat).await.map_err(|e| {
            error!(error = %e, chat_name = %chat.chat_name, "insert chat failed");
            DatabaseError::from_write("insert chat", e)
        })?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            DatabaseError::WriteFailure(format!(
                "insert chat returned a non-ObjectId key: {}",
                result.inserted_id
            ))
        })
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Vec<Chat>> {
        let cursor = self
            .collection
            .find(owner_filter(username))
            .await
            .map_err(|e| {
                error!(error = %e, username, "find chats failed");
                DatabaseError::from_read("find chats", e)
            })?;

        cursor
            .try_collect()
            .await
            .map_err(|e| DatabaseError::from_read("read chats", e))
    }

    async fn find_members(&self, id: &ObjectId) -> DatabaseResult<Option<Vec<String>>> {
        let projection = self
            .collection
            .clone_with_type::<MembersProjection>()
            .find_one(chat_id_filter(id))
            .projection(members_projection())
            .await
            .map_err(|e| {
                error!(error = %e, chat_id = %id, "find chat members failed");
                DatabaseError::from_read("find chat members", e)
            })?;

        Ok(projection.map(|p| p.members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn stored_chat(id: ObjectId) -> Document {
        let chat = Chat {
            id: Some(id),
            members: vec!["alice".to_string()],
            username: Some("alice".to_string()),
            ..Chat::new_room("general", "alice")
        };
        bson::to_document(&chat).unwrap()
    }

    #[test]
    fn filters_target_stored_fields() {
        let id = ObjectId::new();
        let stored = stored_chat(id);

        assert_eq!(owner_filter("alice").get("username"), stored.get("username"));
        assert_eq!(chat_id_filter(&id).get_object_id("_id").unwrap(), id);
        assert_eq!(stored.get_object_id("_id").unwrap(), id);
    }

    #[test]
    fn members_projection_keeps_only_members() {
        let projection = members_projection();
        assert!(stored_chat(ObjectId::new()).contains_key("members"));
        assert_eq!(projection.get_i32("members").unwrap(), 1);
        assert_eq!(projection.get_i32("_id").unwrap(), 0);
        assert_eq!(projection.len(), 2);
    }
}
