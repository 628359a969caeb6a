use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use burrow_api::auth::{AppState, AppStateInner};
use burrow_api::notify::Notifier;
use burrow_server::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burrow=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("BURROW_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("BURROW_DB_PATH").unwrap_or_else(|_| "burrow.db".into());
    let host = std::env::var("BURROW_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("BURROW_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let mail_webhook = std::env::var("BURROW_MAIL_WEBHOOK").ok();

    // Init database
    let db = burrow_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        notifier: Notifier::new(mail_webhook),
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Burrow server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
