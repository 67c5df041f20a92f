//! The bound process: loads configuration, opens the Postgres pool, wires
//! the fabric/engine pair, and serves the HTTP/WebSocket router.

use std::sync::Arc;

use fairstake_api::AppState;
use fairstake_engine::Catalogue;
use fairstake_storage::postgres::PostgresStorage;
use fairstake_storage::Storage;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;

/// Mirrors the original process's environment contract: one flat struct,
/// loaded from `.env` plus whatever the real environment overrides.
#[derive(Debug, Deserialize)]
struct Settings {
    server_host: String,
    server_port: String,
    db_host: String,
    db_port: String,
    db_name: String,
    db_user: String,
    db_user_pwd: String,
    page_size: i64,
    password_salt: String,
    refresh_token_validity: u64,
    #[serde(default = "default_engines")]
    engines: u16,
}

fn default_engines() -> u16 {
    1
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let _ = dotenvy::dotenv();
    let settings: Settings = envy::from_env()?;

    let db_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        settings.db_user, settings.db_user_pwd, settings.db_host, settings.db_port, settings.db_name
    );
    let pool = PgPoolOptions::new()
        .max_connections(settings.engines.max(1) as u32 * 4)
        .connect(&db_url)
        .await?;
    tracing::info!("connected to database");

    let storage: Arc<dyn Storage> = Arc::new(PostgresStorage::new(pool));

    let game_rows = storage.list_games().await?;
    let catalogue = Arc::new(Catalogue::build(&game_rows)?);
    let game_ids: Vec<_> = game_rows.iter().map(|row| row.id).collect();

    let fabric = fairstake_fabric::spawn(game_ids);
    let engine = fairstake_engine::spawn(catalogue, storage.clone(), fabric.clone());

    // The original process signs both tokens off the same configured
    // validity window; kept as-is rather than inventing a separate
    // access-token setting the environment never carried.
    let state = AppState {
        storage,
        engine,
        fabric,
        password_salt: settings.password_salt,
        access_token_validity_secs: settings.refresh_token_validity,
        refresh_token_validity_secs: settings.refresh_token_validity,
        page_size: settings.page_size,
    };

    let app = fairstake_api::router(state);

    let addr = format!("{}:{}", settings.server_host, settings.server_port);
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
