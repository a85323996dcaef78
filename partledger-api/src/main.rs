//! # PartLedger API Server
//!
//! HTTP server for the consignment shop: consigner and part management,
//! filtered inventory listings, CSV bulk import, invoice PDF generation,
//! and the notification emails that ride along.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/partledger \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p partledger-api
//! ```

use partledger_api::{
    app::{build_router, AppState},
    config::Config,
};
use partledger_shared::db::{migrations, pool};
use partledger_shared::mailer::{Mailer, MailerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partledger_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "PartLedger API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let mailer = Mailer::new(&MailerConfig {
        host: config.smtp.host.clone(),
        port: config.smtp.port,
        username: config.smtp.username.clone(),
        password: config.smtp.password.clone(),
        from: config.smtp.from.clone(),
    })?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
