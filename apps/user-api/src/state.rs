//! Application state management.
//!
//! Shared state passed to all request handlers. Cloning is cheap: the
//! MongoDB client shares its underlying connection pool across clones.

use mongodb::{Client, Database};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
}
