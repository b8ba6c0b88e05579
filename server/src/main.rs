//! `contact-server` entry point.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use contact_server::AppState;
use contact_server::ServerConfig;
use contact_store::DEFAULT_DEMO_PATIENTS;
use contact_store::PatientStore;

#[derive(Debug, Parser)]
#[command(name = "contact-server", version, about = "Patient contact REST service")]
struct Args {
    /// Address to listen on (overrides config and CONTACT_BIND_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// SQLite database file (overrides config and CONTACT_DB_PATH).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Insert demo patients when the store is empty.
    #[arg(long)]
    seed: bool,

    /// Number of demo patients to insert with --seed.
    #[arg(long, default_value_t = DEFAULT_DEMO_PATIENTS)]
    seed_count: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load().context("loading server config")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(db) = args.db {
        config.db_path = db;
    }
    config.seed_demo |= args.seed;

    tracing::info!("contact-server v{} starting", env!("CARGO_PKG_VERSION"));

    let mut store = PatientStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    tracing::info!("Patient store at {}", config.db_path.display());

    if config.seed_demo {
        store
            .seed_demo(args.seed_count)
            .context("seeding demo patients")?;
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    contact_server::serve(listener, AppState::new(store), async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Signal received, shutting down");
    })
    .await
    .context("serving HTTP")?;

    tracing::info!("contact-server exiting cleanly");
    Ok(())
}
