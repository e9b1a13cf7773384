use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load .env (if present) before reading configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.url());

    // A service without its store is not viable: any connection or ping
    // failure propagates out of main and terminates the process. No retry.
    let mongo_client = database::mongodb::connect_from_config(&config.mongodb).await?;
    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    let app_info = config.app;
    let server_config = config.server.clone();
    let cleanup_client = mongo_client.clone();

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    // Build router with API routes mounted at the root
    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(api_routes);

    // Merge the liveness endpoint
    let app = router.merge(health_router(app_info));

    info!("Starting user API with graceful shutdown (30s timeout)");

    create_production_app(app, &server_config, Duration::from_secs(30), async move {
        info!("Shutting down: closing MongoDB connections");
        // MongoDB client closes automatically on drop
        drop(cleanup_client);
        info!("MongoDB connection closed successfully");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("User API shutdown complete");
    Ok(())
}
