use mongodb::{bson::doc, options::ClientOptions, Client};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;

/// Error type for MongoDB connection setup
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Connect using a MongoConfig and verify the server is reachable.
///
/// The whole sequence (option parsing, client construction, ping) is bounded
/// by `config.connect_timeout_secs`. There is no retry: a service without
/// its store is not viable, so the caller is expected to treat any error as
/// fatal.
pub async fn connect_from_config(config: &MongoConfig) -> Result<Client, MongoError> {
    info!("Attempting to connect to MongoDB at {}", config.url());

    let deadline = Duration::from_secs(config.connect_timeout_secs);

    let mut options = ClientOptions::parse(config.url()).await?;
    options.connect_timeout = Some(deadline);
    options.server_selection_timeout = Some(deadline);

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;

    // Verify liveness; the driver connects lazily so the ping is what
    // actually exercises the topology.
    tokio::time::timeout(
        deadline,
        client
            .database(config.database())
            .run_command(doc! { "ping": 1 }),
    )
    .await
    .map_err(|_| {
        MongoError::ConnectionFailed(format!("ping timed out after {}s", deadline.as_secs()))
    })?
    .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

    info!("Successfully connected to MongoDB");
    Ok(client)
}
