//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, FileCatalogAdapter, FileSlotAdapter, GatewayPaymentAdapter, HttpCatalogAdapter,
        SandboxPaymentAdapter,
    },
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use aura_core::{
    CatalogService, DurableSlot, PaymentService, ProfileStore, SessionFacade, SystemClock,
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Durable Slot ---
    let slot: Arc<dyn DurableSlot> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            info!("Storing session records under {}", config.data_dir.display());
            Arc::new(FileSlotAdapter::new(config.data_dir.clone()))
        }
    };

    // --- 3. Initialize Collaborator Adapters ---
    let catalog: Box<dyn CatalogService> = match &config.catalog_url {
        Some(url) => {
            info!("Catalog source: {}", url);
            Box::new(HttpCatalogAdapter::new(url)?)
        }
        None => {
            info!("Catalog source: {}", config.catalog_path.display());
            Box::new(FileCatalogAdapter::new(config.catalog_path.clone()))
        }
    };

    let payments: Arc<dyn PaymentService> = match &config.payment_api_token {
        Some(token) => Arc::new(GatewayPaymentAdapter::new(
            config.payment_api_url.clone(),
            token.clone(),
        )?),
        None => Arc::new(SandboxPaymentAdapter::new()),
    };

    // --- 4. Restore the Session & Build the Shared AppState ---
    let session = SessionFacade::start(
        ProfileStore::new(slot),
        catalog.as_ref(),
        payments,
        Arc::new(SystemClock),
    )
    .await?;
    let app_state = AppState::new(session, config.clone());
    let background = web::spawn_background_tasks(app_state.clone());

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; operator routes are disabled.");
    }

    // --- 5. Create the Web Router ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(web::middleware::ADMIN_TOKEN_HEADER),
        ]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state.clone()).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let shutdown = app_state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
            shutdown.cancel();
        })
        .await?;

    // --- 7. Stop the Background Loops ---
    app_state.shutdown.cancel();
    app_state.toasts.cancel_all().await;
    for handle in background {
        if let Err(e) = handle.await {
            warn!("Background task ended abnormally: {}", e);
        }
    }
    info!("Server stopped.");

    Ok(())
}
