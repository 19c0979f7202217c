//! # Tasklane API Server
//!
//! Multi-user task tracker over HTTP: accounts, bearer-token sessions and
//! per-user task lists.
//!
//! ## Usage
//!
//! ```bash
//! STORAGE_BACKEND=memory JWT_SECRET=$(openssl rand -hex 32) cargo run -p tasklane-api
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tasklane_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use tasklane_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool},
    },
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired token revocations are swept
const REVOCATION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Tasklane API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (store, pg) = open_store(&config).await?;
    spawn_revocation_sweeper(store.clone());

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg) = pg {
        close_pool(pg.pool().clone()).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tasklane_api=debug,tasklane_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Opens the configured store; the postgres store is also returned so its
/// pool can be closed on shutdown
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgStore>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on shutdown");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            Ok((store, None))
        }
        StorageBackend::Postgres => {
            let db_config = config
                .database_config()
                .context("DATABASE_URL environment variable is required")?;

            ensure_database_exists(&db_config.url).await?;
            let pool = create_pool(db_config)
                .await
                .context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).await?;

            let pg = PgStore::new(pool);
            let store: Arc<dyn Store> = Arc::new(pg.clone());
            Ok((store, Some(pg)))
        }
    }
}

fn spawn_revocation_sweeper(store: Arc<dyn Store>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REVOCATION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match store.as_revocations().purge_expired_revocations().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Swept expired token revocations"),
                Err(e) => tracing::warn!(error = %e, "Failed to sweep token revocations"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
