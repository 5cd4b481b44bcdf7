use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use glimpse_core::config::Config;
use glimpse_duckdb::DuckDbBackend;
use glimpse_server::auth::{session, TokenService};
use glimpse_server::ingest::geo::MaxMindResolver;
use glimpse_server::state::AppState;

/// `glimpse health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$GLIMPSE_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("GLIMPSE_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

/// Open the database and resolve the signing secret the same way for the
/// server and for the `token` subcommand, so issued tokens verify.
async fn open_store(cfg: &Config) -> Result<(DuckDbBackend, String)> {
    std::fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("failed to create data dir {}", cfg.data_dir))?;
    let db_path = cfg.db_path();
    let db = DuckDbBackend::open(&db_path.to_string_lossy(), &cfg.duckdb_memory_limit)?;

    let secret = match &cfg.token_secret {
        Some(secret) => secret.clone(),
        None => db.ensure_token_secret().await?,
    };
    Ok((db, secret))
}

/// `glimpse token <email>`: upsert the user and print a 24h identity token.
async fn run_issue_token(cfg: &Config, email: &str) -> Result<()> {
    let (db, secret) = open_store(cfg).await?;
    let tokens = TokenService::new(&secret);
    let token = session::sign_in(&db, &tokens, email).await?;
    println!("{token}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("glimpse=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    if args.get(1).map(|s| s.as_str()) == Some("token") {
        let email = args
            .get(2)
            .context("usage: glimpse token <email>")?;
        return run_issue_token(&cfg, email).await;
    }

    // Every event needs a country, so the server refuses to start without
    // a GeoIP database.
    if !std::path::Path::new(&cfg.geoip_path).exists() {
        anyhow::bail!(
            "GeoIP database not found at {}. Set GLIMPSE_GEOIP_PATH to a MaxMind City .mmdb file.",
            cfg.geoip_path
        );
    }
    let geo = Arc::new(MaxMindResolver::open(&cfg.geoip_path)?);
    info!(geoip_path = %cfg.geoip_path, "GeoIP database loaded");

    let (db, secret) = open_store(&cfg).await?;
    if cfg.token_secret.is_none() {
        info!("using token secret persisted in settings");
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let port = cfg.port;
    let state = Arc::new(AppState::new(db, cfg, geo, &secret));
    let app = glimpse_server::app::build_app(state);

    info!(port, "Glimpse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    Ok(())
}
