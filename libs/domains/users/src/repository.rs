use async_trait::async_trait;

use crate::error::UserResult;
use crate::models::{UpdateUser, User, UserFilter, UserQuery};

/// Repository trait for user persistence
///
/// Defines the data access interface for user records; the production
/// implementation is [`crate::MongoUserRepository`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user document
    async fn insert(&self, user: &User) -> UserResult<()>;

    /// Fetch a user by exact username match
    async fn find_by_username(&self, username: &str) -> UserResult<Option<User>>;

    /// Check whether a username is already taken
    async fn exists_by_username(&self, username: &str) -> UserResult<bool>;

    /// Count users matching the filter
    async fn count(&self, filter: &UserFilter) -> UserResult<u64>;

    /// Fetch one page of users
    async fn find_page(&self, query: &UserQuery) -> UserResult<Vec<User>>;

    /// Apply a partial update to the document matching `username`.
    ///
    /// Unconditional: whether a document actually matched is not reported.
    async fn apply_update(&self, username: &str, update: &UpdateUser) -> UserResult<()>;
}
