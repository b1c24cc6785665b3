use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use comment_service::config::{Config, StorageBackend};
use comment_service::handlers::{self, AppState};
use comment_service::{MemoryThreadStore, PostgresThreadStore, ThreadService, ThreadStore};
use db_pool::{create_pool, DbConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "comment-service";

async fn build_store(config: &Config) -> Result<Arc<dyn ThreadStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory thread store");
            Ok(Arc::new(MemoryThreadStore::new()))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .storage
                .database_url
                .clone()
                .context("DATABASE_URL must be set for the postgres backend")?;

            let db_config = DbConfig::new(SERVICE_NAME, database_url);
            db_config.log_config();

            let pool = create_pool(db_config)
                .await
                .context("Failed to connect to database")?;

            let store = PostgresThreadStore::new(pool);
            store
                .migrate()
                .await
                .context("Failed to run database migrations")?;

            info!("Using PostgreSQL thread store");
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comment_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {}", SERVICE_NAME);

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        backend = ?config.storage.backend,
        port = config.app.port,
        "Configuration loaded"
    );

    let store = build_store(&config).await?;
    let service = ThreadService::new(store, config.notifications.channel_capacity);
    let state = web::Data::new(AppState::new(service, config.pagination.clone()));

    let bind_addr = (config.app.host.clone(), config.app.port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    let allowed_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("{} stopped", SERVICE_NAME);
    Ok(())
}
