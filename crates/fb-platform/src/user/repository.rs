//! User Repository

use std::collections::HashMap;

use mongodb::{bson::doc, options::ReturnDocument, Collection, Database};
use futures::TryStreamExt;

use crate::user::entity::{Role, User};
use crate::shared::error::Result;

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Resolve usernames for a set of user IDs in one query. IDs that no
    /// longer resolve are simply absent from the map; callers project
    /// `null` for those (votes and comments are never cascaded on user
    /// deletion).
    pub async fn find_usernames(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let cursor = self.collection.find(doc! { "_id": { "$in": ids } }).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    /// Targeted role update; returns the post-update document.
    pub async fn set_role(&self, id: &str, role: Role) -> Result<Option<User>> {
        let role = bson::ser::to_bson(&role)?;
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "role": role, "updatedAt": bson::DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "password": password_hash, "updatedAt": bson::DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Partial profile update; only supplied fields are overwritten.
    pub async fn update_profile(
        &self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        if let Some(username) = username {
            set.insert("username", username);
        }
        if let Some(email) = email {
            set.insert("email", email);
        }

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
