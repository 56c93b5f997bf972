use tracing_subscriber::EnvFilter;

use healthcard::api::router::build_router;
use healthcard::config::{Settings, APP_NAME, APP_VERSION};
use healthcard::db;
use healthcard::ApiContext;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        app = APP_NAME,
        version = APP_VERSION,
        db = %settings.database_path.display(),
        "starting"
    );

    let conn = db::open_database(&settings.database_path)?;
    let bind_addr = settings.bind_addr.clone();
    let ctx = ApiContext::new(conn, settings);
    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
