//! LeagueLink REST server.
//!
//! Serves the channel, tournament and bracket API backed by PostgreSQL, or by
//! process memory with `--in-memory`.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use leaguelink::db::{Database, Repositories};
use leaguelink_server::{api, config::ServerConfig, logging, metrics};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run the LeagueLink tournament server

USAGE:
  leaguelink_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/leaguelink]

FLAGS:
  --in-memory              Keep all data in process memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required, at least 32 bytes)
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 bytes)
  TOKEN_TTL_HOURS          Access token lifetime [default: 24]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    info!("Starting LeagueLink server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{metrics_bind}/metrics");
    }

    let (repos, database) = if args.in_memory {
        info!("Using in-memory storage; data is lost on shutdown");
        (Repositories::in_memory(), None)
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to apply migrations")?;
        info!("Database connected and migrated");
        (Repositories::postgres(db.pool().clone()), Some(db))
    };

    let state = api::AppState::new(&repos, &config.security, database.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Keep serving; the process can still be stopped by SIGKILL
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
