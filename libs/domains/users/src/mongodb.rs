//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::FindOptions,
};
use std::future::IntoFuture;
use std::time::Duration;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{UpdateUser, User, UserFilter, UserQuery};
use crate::repository::UserRepository;

/// Deadline for any single collection operation
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository on the default "users" collection
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let db = client.database("users");
    /// let repo = MongoUserRepository::new(db);
    /// ```
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<User>("users");
        Self { collection }
    }

    /// Create a MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Build a MongoDB filter document from UserFilter
    fn build_filter(filter: &UserFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref username) = filter.username {
            doc.insert("username", username);
        }

        if let Some(expiry_date) = filter.expiry_date {
            doc.insert("expiry_date", expiry_date);
        }

        if let Some(ref outputs) = filter.outputs {
            doc.insert("outputs", outputs);
        }

        doc
    }

    /// Build the `$set` document for a partial update.
    ///
    /// Empty strings and a zero expiry are skipped; `outputs` is applied
    /// whenever present, including an explicit empty array.
    fn build_update(update: &UpdateUser) -> Document {
        let mut doc = doc! {};

        if let Some(ref username) = update.username {
            if !username.is_empty() {
                doc.insert("username", username);
            }
        }

        if let Some(expiry_date) = update.expiry_date {
            if expiry_date != 0 {
                doc.insert("expiry_date", expiry_date);
            }
        }

        if let Some(ref password) = update.password {
            if !password.is_empty() {
                doc.insert("password", password);
            }
        }

        if let Some(ref outputs) = update.outputs {
            doc.insert("outputs", outputs.clone());
        }

        doc
    }

    /// Run a driver call under [`OP_TIMEOUT`].
    ///
    /// Driver errors and timeouts are logged here; the caller-facing error
    /// carries only the operation's public message.
    async fn timed<T>(
        fut: impl IntoFuture<Output = Result<T, mongodb::error::Error>>,
        message: &str,
    ) -> UserResult<T> {
        match tokio::time::timeout(OP_TIMEOUT, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "MongoDB operation failed");
                Err(UserError::Database(message.to_string()))
            }
            Err(_) => {
                tracing::error!(timeout = ?OP_TIMEOUT, "MongoDB operation timed out");
                Err(UserError::Database(message.to_string()))
            }
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: &User) -> UserResult<()> {
        Self::timed(self.collection.insert_one(user), "Error adding user").await?;

        tracing::info!("User created successfully");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        Self::timed(
            self.collection.find_one(doc! { "username": username }),
            "Error retrieving user",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn exists_by_username(&self, username: &str) -> UserResult<bool> {
        let count = Self::timed(
            self.collection.count_documents(doc! { "username": username }),
            "Error checking username availability",
        )
        .await?;

        Ok(count > 0)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &UserFilter) -> UserResult<u64> {
        Self::timed(
            self.collection.count_documents(Self::build_filter(filter)),
            "Error counting records",
        )
        .await
    }

    #[instrument(skip(self, query))]
    async fn find_page(&self, query: &UserQuery) -> UserResult<Vec<User>> {
        let mut options = FindOptions::builder()
            .limit(query.limit)
            .skip(query.offset)
            .build();
        options.sort = query.sort.as_ref().map(|(field, direction)| {
            let mut sort = Document::new();
            sort.insert(field.as_str(), direction.order());
            sort
        });

        let cursor = Self::timed(
            self.collection
                .find(Self::build_filter(&query.filter))
                .with_options(options),
            "Error retrieving users",
        )
        .await?;

        Self::timed(cursor.try_collect(), "Error decoding users").await
    }

    #[instrument(skip(self, update))]
    async fn apply_update(&self, username: &str, update: &UpdateUser) -> UserResult<()> {
        let changes = Self::build_update(update);
        if changes.is_empty() {
            // MongoDB rejects an empty $set; an all-skipped patch is a no-op
            return Ok(());
        }

        Self::timed(
            self.collection
                .update_one(doc! { "username": username }, doc! { "$set": changes }),
            "Error updating user",
        )
        .await?;

        // Matched/modified counts are intentionally not inspected
        tracing::info!("User updated successfully");
        Ok(())
    }
}
