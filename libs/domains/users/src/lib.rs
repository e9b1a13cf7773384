//! Users Domain
//!
//! Complete domain implementation for the user record collection backed by
//! MongoDB, layered the usual way:
//!
//! handlers (HTTP endpoints) → service (validation, orchestration) →
//! repository (trait + MongoDB implementation) → models (entities, DTOs).
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{handlers, MongoUserRepository, UserService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("users");
//!
//! let repository = MongoUserRepository::new(db);
//! let service = UserService::new(repository);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{CreateUser, ListUsersQuery, UpdateUser, User, UserPage, UserView};
pub use mongodb::MongoUserRepository;
pub use repository::UserRepository;
pub use service::UserService;
