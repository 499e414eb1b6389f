//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStorage, OpenAiDescriptionAdapter, PgRecordBackend, ToastLog},
    config::{Config, StorageMode},
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use lifedeal_core::local::{default_category_records, LocalRecordBackend};
use lifedeal_core::ports::RecordBackend;
use lifedeal_core::schema::CATEGORY_SCHEMA;
use lifedeal_core::{DashboardController, DashboardState};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Record Backend ---
    let backend: Arc<dyn RecordBackend> = match &config.storage {
        StorageMode::Database(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            let db_backend = PgRecordBackend::new(db_pool);
            info!("Running database migrations...");
            db_backend.run_migrations().await?;
            db_backend
                .seed_if_empty(CATEGORY_SCHEMA.table, default_category_records())
                .await?;
            info!("Database ready.");
            Arc::new(db_backend)
        }
        StorageMode::Local(dir) => {
            warn!(
                "DATABASE_URL not set; running in local mode with data in {}",
                dir.display()
            );
            Arc::new(LocalRecordBackend::with_default_seeds(Arc::new(
                FileStorage::new(dir.clone()),
            )))
        }
    };

    // --- 3. Initialize Service Adapters ---
    let toasts = Arc::new(ToastLog::new(config.notification_capacity));
    let mut controller = DashboardController::new(backend, toasts.clone());

    match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            controller = controller.with_description_service(Arc::new(
                OpenAiDescriptionAdapter::new(openai_client, config.description_model.clone()),
            ));
        }
        None => warn!("OPENAI_API_KEY not set; description generation is disabled"),
    }

    // --- 4. Initial Load ---
    // A failed load is not fatal: POST /dashboard/reload retries it.
    if let DashboardState::Error(message) = controller.load().await {
        warn!("Initial dashboard load failed: {}", message);
    }

    // --- 5. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(controller, toasts, config.clone()));
    let app = build_router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
