use dotenvy::dotenv;
use lumanet_admin::api::{AppState, build_router};
use lumanet_admin::config::database::{DEFAULT_DATABASE_URL, create_connection, create_tables};
use lumanet_admin::config::{AppConfig, BackendMode, load_app_configuration};
use lumanet_admin::core::auth::{SessionStore, seed_default_admin};
use lumanet_admin::core::workbench::{Console, WorkbenchSettings};
use lumanet_admin::errors::Result;
use lumanet_admin::store::{DemoBackend, LocalStorage, SqlBackend, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();

    // 3. Load the application configuration
    let config = load_app_configuration()?;
    let catalog = config.catalog()?;

    // 4. Open local storage; sessions live there in both modes
    let storage = LocalStorage::open(&config.storage_path)
        .await
        .inspect_err(|e| error!("Failed to open local storage: {}", e))?;

    // 5. Pick the backend
    let store = open_store(&config, storage.clone()).await?;

    // 6. Make sure the default administrator exists
    if seed_default_admin(&store, &config.admin).await?.is_some() {
        info!("Default administrator {} created", config.admin.email);
    }

    let state = Arc::new(AppState {
        console: Console::new(store, WorkbenchSettings::from(&config)),
        sessions: SessionStore::new(storage),
        catalog,
        admin_email: config.admin.email.clone(),
    });
    let app = build_router(Arc::clone(&state));

    // 7. Serve until Ctrl-C, then flush pending edits
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, saving pending changes");
    state.console.save_all().await;
    Ok(())
}

async fn open_store(config: &AppConfig, storage: LocalStorage) -> Result<Store> {
    match config.backend_mode() {
        BackendMode::Remote => {
            let url = config.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL);
            if url == DEFAULT_DATABASE_URL {
                tokio::fs::create_dir_all("data").await?;
            }
            let db = create_connection(url)
                .await
                .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
            create_tables(&db).await?;
            info!("Using database backend");
            Ok(Store::Remote(SqlBackend::new(db)))
        }
        BackendMode::Demo => {
            warn!(
                "Running in demo mode, data is kept in {}",
                config.storage_path.display()
            );
            let backend = DemoBackend::new(storage)
                .with_latency(Duration::from_millis(config.demo.latency_ms));
            Ok(Store::Demo(backend))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
