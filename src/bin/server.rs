//! School records server: reads settings, ensures the database and tables exist,
//! optionally seeds sample rows, then serves the student routes.

use school_records::{
    app, apply_migrations, ensure_database_exists, seed_if_empty, AppState, PgStore, SchoolStore, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("school_records=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    apply_migrations(&pool, &settings.schema).await?;
    let store = PgStore::new(pool, settings.schema.clone());
    if settings.seed_data {
        seed_if_empty(&store).await?;
    }

    let store: Arc<dyn SchoolStore> = Arc::new(store);
    let router = app(AppState::new(store), settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
