use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use bistro_service::config::ServiceConfig;
use bistro_service::gateway::{PaymentProcessor, StripeProcessor, StubProcessor};
use bistro_service::metrics::ServiceMetrics;
use bistro_service::store::Store;
use bistro_service::{build_router, AppState, SERVICE_NAME};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;

    let store = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("postgres store ready");
            Store::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
            Store::in_memory()
        }
    };

    let processor: Arc<dyn PaymentProcessor> = match &config.payment_secret_key {
        Some(key) => Arc::new(
            StripeProcessor::new(&config.payment_api_base, key, config.payment_timeout)
                .context("Failed to build payment processor client")?,
        ),
        None => {
            warn!("PAYMENT_SECRET_KEY not set; payment intents use the local stub processor");
            Arc::new(StubProcessor::new())
        }
    };

    let metrics = Arc::new(ServiceMetrics::new()?);
    let state = AppState::new(store.clone(), config.jwt.clone(), processor, metrics);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    let app = build_router(state).layer(cors);

    info!(addr = %config.bind_addr, "starting {SERVICE_NAME}");
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("{SERVICE_NAME} stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
    }
}
