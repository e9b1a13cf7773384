use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{UserError, UserResult};

/// Default page size for the list endpoint
pub const DEFAULT_LIMIT: i64 = 50;

/// User record as stored in MongoDB.
///
/// Also serves as the create-endpoint response body: create echoes the full
/// inserted document, password included. Read paths go through [`UserView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier across the collection
    pub username: String,
    /// Epoch-seconds expiry timestamp
    pub expiry_date: i64,
    /// Ordered output names
    pub outputs: Vec<String>,
    pub password: String,
}

/// Read-path projection of [`User`]; the password never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub username: String,
    pub expiry_date: i64,
    pub outputs: Vec<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            expiry_date: user.expiry_date,
            outputs: user.outputs,
        }
    }
}

/// DTO for creating a new user.
///
/// Every field carries `#[serde(default)]` so a missing field deserializes
/// to its zero value and is reported by [`CreateUser::validate`] as
/// "<field> required" rather than as a body parse failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub expiry_date: i64,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub password: String,
}

impl CreateUser {
    /// Field checks, in the order the API contract promises them.
    pub fn validate(&self) -> UserResult<()> {
        if self.username.is_empty() {
            return Err(UserError::Validation("username required".to_string()));
        }
        if self.expiry_date == 0 {
            return Err(UserError::Validation("expiry date required".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(UserError::Validation("outputs required".to_string()));
        }
        if self.password.is_empty() {
            return Err(UserError::Validation("password required".to_string()));
        }
        Ok(())
    }
}

impl From<CreateUser> for User {
    fn from(input: CreateUser) -> Self {
        Self {
            username: input.username,
            expiry_date: input.expiry_date,
            outputs: input.outputs,
            password: input.password,
        }
    }
}

/// DTO for partially updating an existing user.
///
/// A string field is applied only when present and non-empty, the expiry
/// only when non-zero; `outputs` is applied whenever present (an explicit
/// empty array does overwrite). There is deliberately no way to clear a
/// field back to its zero value through this endpoint.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub expiry_date: Option<i64>,
    pub outputs: Option<Vec<String>>,
    pub password: Option<String>,
}

/// Sort direction for the list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// MongoDB sort order value
    pub fn order(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Equality filters for the list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub username: Option<String>,
    pub expiry_date: Option<i64>,
    /// Matches documents whose outputs sequence contains this value
    pub outputs: Option<String>,
}

/// Fully resolved list request: filters plus paging and sorting
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub limit: i64,
    pub offset: u64,
    /// None means no sort document is sent (collection natural order)
    pub sort: Option<(String, SortDirection)>,
}

/// Raw query parameters of `GET /users`.
///
/// Numeric parameters are kept as strings so that present-but-unparsable
/// values map to the contract's per-parameter 400s instead of an extractor
/// rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct ListUsersQuery {
    /// Page size, positive integer (default 50)
    pub limit: Option<String>,
    /// Page number, positive integer (default 1)
    pub page: Option<String>,
    /// Exact-match username filter
    pub username: Option<String>,
    /// Exact-match expiry filter
    pub expiry_date: Option<String>,
    /// Exact-match filter against the outputs sequence
    pub outputs: Option<String>,
    /// Sort field; a leading `-` forces descending
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// `desc` sorts descending, overridden by a leading `-` on sortBy
    pub order: Option<String>,
}

impl ListUsersQuery {
    /// Resolve the raw parameters into a [`UserQuery`].
    pub fn resolve(self) -> UserResult<UserQuery> {
        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|l| *l > 0)
                .ok_or_else(|| UserError::Validation("Invalid 'limit' parameter".to_string()))?,
        };

        let page = match self.page.as_deref() {
            None => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| UserError::Validation("Invalid 'page' parameter".to_string()))?,
        };

        let offset = ((page - 1) * limit) as u64;

        // An empty filter value means the parameter was not supplied
        let expiry_date = match self.expiry_date.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| UserError::Validation("Invalid 'expiry' parameter".to_string()))?,
            ),
        };

        let filter = UserFilter {
            username: self.username.filter(|u| !u.is_empty()),
            expiry_date,
            outputs: self.outputs.filter(|o| !o.is_empty()),
        };

        let mut direction = match self.order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        // A leading '-' on sortBy takes precedence over order=desc
        let mut field = self.sort_by.unwrap_or_default();
        if let Some(stripped) = field.strip_prefix('-') {
            direction = SortDirection::Descending;
            field = stripped.to_string();
        }
        let field = field.to_lowercase();

        let sort = if field.is_empty() {
            None
        } else {
            Some((field, direction))
        };

        Ok(UserQuery {
            filter,
            limit,
            offset,
            sort,
        })
    }
}

/// Response body of the list endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserPage {
    pub records: Vec<UserView>,
    pub total_pages: i64,
    pub total_records: u64,
}

/// Acknowledgement body of the partial-update endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateResponse {
    pub status: bool,
    pub message: String,
}
