//! User repository backed by the `users` collection.

use super::UserRepository;
use crate::entities::user::PasswordHashProjection;
use crate::entities::User;
use crate::types::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use tracing::error;

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(collection: Collection<User>) -> Self {
        Self { collection }
    }
}

fn username_filter(username: &str) -> Document {
    doc! { "username": username }
}

fn usernames_filter(usernames: &[String]) -> Document {
    doc! { "username": { "$in": usernames.to_vec() } }
}

fn password_hash_projection() -> Document {
    doc! { "_id": 0, "passwordhash": 1 }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        self.collection.insert_one(user).await.map_err(|e| {
            error!(error = %e, username = %user.username, "insert user failed");
            DatabaseError::from_write("insert user", e)
        })?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        self.collection
            .find_one(username_filter(username))
            .await
            .map_err(|e| {
                error!(error = %e, username, "find user failed");
                DatabaseError::from_read("find user", e)
            })
    }

    async fn find_password_hash(&self, username: &str) -> DatabaseResult<Option<String>> {
        let projection = self
            .collection
            .clone_with_type::<PasswordHashProjection>()
            .find_one(username_filter(username))
            .projection(password_hash_projection())
            .await
            .map_err(|e| {
                error!(error = %e, username, "find password hash failed");
                DatabaseError::from_read("find password hash", e)
            })?;

        Ok(projection.map(|p| p.password_hash))
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> DatabaseResult<Vec<User>> {
        let cursor = self
            .collection
            .find(usernames_filter(usernames))
            .await
            .map_err(|e| DatabaseError::from_read("find users", e))?;

        cursor.try_collect().await.map_err(|e| {
            error!(error = %e, "reading users cursor failed");
            DatabaseError::from_read("read users", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, Bson};

    fn stored_user() -> Document {
        bson::to_document(&User::new("alice", "hash", "alice@example.com")).unwrap()
    }

    #[test]
    fn filters_target_the_stored_username_field() {
        let stored = stored_user();

        let filter = username_filter("alice");
        assert_eq!(filter.get("username"), stored.get("username"));

        let filter = usernames_filter(&["alice".to_string(), "bob".to_string()]);
        let clause = filter.get_document("username").unwrap();
        assert_eq!(
            clause.get_array("$in").unwrap(),
            &vec![Bson::from("alice"), Bson::from("bob")]
        );
    }

    #[test]
    fn password_projection_keeps_only_the_hash() {
        let projection = password_hash_projection();
        assert!(stored_user().contains_key("passwordhash"));
        assert_eq!(projection.get_i32("passwordhash").unwrap(), 1);
        assert_eq!(projection.get_i32("_id").unwrap(), 0);
        assert_eq!(projection.len(), 2);

        let projected = doc! { "passwordhash": "hash" };
        let decoded: PasswordHashProjection = bson::from_document(projected).unwrap();
        assert_eq!(decoded.password_hash, "hash");
    }
}
