use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use folio::config::{Cli, Config};
use folio::state::AppState;
use folio::{bootstrap, db, mail, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Initialize database
    let db_path = config.db_path();
    tracing::info!("Database: {}", db_path.display());
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    // Seed the super-admin once, before serving anything
    {
        let mut conn = pool.get()?;
        let outcome =
            bootstrap::ensure_super_admin(&mut conn, &config.admin, config.auth.bcrypt_cost)?;
        tracing::debug!("Bootstrap outcome: {:?}", outcome);
    }

    let mailer = mail::from_config(&config.mail)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(pool, config, mailer);
    let app = routes::app(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
