//! User service - validation and orchestration

use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, ListUsersQuery, UpdateUser, User, UserPage, UserView};
use crate::repository::UserRepository;

/// User service providing the operations behind the HTTP endpoints.
///
/// The service layer owns input validation and orchestrates repository
/// operations; the repository owns storage semantics and timeouts.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user.
    ///
    /// Validates the fields in contract order, then checks username
    /// availability before inserting. The check and the insert are two
    /// separate operations: two concurrent creates with the same username
    /// can still both succeed (there is no unique index on username).
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input.validate()?;

        if self.repository.exists_by_username(&input.username).await? {
            return Err(UserError::UsernameTaken);
        }

        let user = User::from(input);
        self.repository.insert(&user).await?;
        Ok(user)
    }

    /// Fetch a user by username, without the password.
    #[instrument(skip(self))]
    pub async fn get_user(&self, username: &str) -> UserResult<UserView> {
        self.repository
            .find_by_username(username)
            .await?
            .map(UserView::from)
            .ok_or(UserError::NotFound)
    }

    /// List users: resolve the raw query, count matches, fetch the page.
    #[instrument(skip(self, query))]
    pub async fn list_users(&self, query: ListUsersQuery) -> UserResult<UserPage> {
        let query = query.resolve()?;

        let total_records = self.repository.count(&query.filter).await?;
        let total_pages = (total_records as i64 + query.limit - 1) / query.limit;

        let records = self
            .repository
            .find_page(&query)
            .await?
            .into_iter()
            .map(UserView::from)
            .collect();

        Ok(UserPage {
            records,
            total_pages,
            total_records,
        })
    }

    /// Apply a partial update to the user matching `username`.
    ///
    /// Unconditional: succeeds whether or not a document matched.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, username: &str, update: UpdateUser) -> UserResult<()> {
        self.repository.apply_update(username, &update).await
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;

    fn valid_input() -> CreateUser {
        CreateUser {
            username: "alice".to_string(),
            expiry_date: 1999999999,
            outputs: vec!["a".to_string(), "b".to_string()],
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_any_repository_call() {
        // No expectations configured: any repository call would panic
        let service = UserService::new(MockUserRepository::new());

        let err = service.create_user(CreateUser::default()).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
        assert_eq!(err.to_string(), "username required");
    }

    #[tokio::test]
    async fn create_rejects_a_taken_username_without_inserting() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username()
            .withf(|username| username == "alice")
            .returning(|_| Ok(true));

        let service = UserService::new(repo);

        let err = service.create_user(valid_input()).await.unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    #[tokio::test]
    async fn create_inserts_and_echoes_the_record() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|user| user.username == "alice" && user.password == "pw")
            .returning(|_| Ok(()));

        let service = UserService::new(repo);

        let user = service.create_user(valid_input()).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password, "pw");
    }

    #[tokio::test]
    async fn get_user_maps_a_missing_document_to_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));

        let service = UserService::new(repo);

        let err = service.get_user("ghost").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn get_user_projects_the_password_away() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(|_| Ok(Some(User::from(valid_input()))));

        let service = UserService::new(repo);

        let view = service.get_user("alice").await.unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.expiry_date, 1999999999);
    }

    #[tokio::test]
    async fn list_users_computes_pagination() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|_| Ok(5));
        repo.expect_find_page()
            .withf(|query| query.limit == 2 && query.offset == 2)
            .returning(|_| {
                Ok(vec![
                    User::from(valid_input()),
                    User {
                        username: "bob".to_string(),
                        ..User::from(valid_input())
                    },
                ])
            });

        let service = UserService::new(repo);

        let page = service
            .list_users(ListUsersQuery {
                limit: Some("2".to_string()),
                page: Some("2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_records, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.records.len(), 2);
    }

    #[tokio::test]
    async fn list_users_with_no_matches_reports_zero_pages() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|_| Ok(0));
        repo.expect_find_page().returning(|_| Ok(vec![]));

        let service = UserService::new(repo);

        let page = service.list_users(ListUsersQuery::default()).await.unwrap();
        assert_eq!(page.total_records, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn list_users_rejects_bad_parameters_before_any_repository_call() {
        let service = UserService::new(MockUserRepository::new());

        let err = service
            .list_users(ListUsersQuery {
                limit: Some("plenty".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid 'limit' parameter");
    }

    #[tokio::test]
    async fn update_user_passes_the_patch_through() {
        let mut repo = MockUserRepository::new();
        repo.expect_apply_update()
            .withf(|username, update| {
                username == "alice" && update.outputs.as_deref() == Some(&["c".to_string()][..])
            })
            .returning(|_, _| Ok(()));

        let service = UserService::new(repo);

        let update = UpdateUser {
            outputs: Some(vec!["c".to_string()]),
            ..Default::default()
        };
        service.update_user("alice", update).await.unwrap();
    }
}
