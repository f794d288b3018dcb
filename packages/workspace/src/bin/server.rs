use anyhow::Context;
use clap::Parser;
use pagewright_compiler::CompileCache;
use pagewright_store::{InMemoryStore, NewApplication};
use pagewright_workspace::{router, AppState, BroadcastHub, Config, VersionManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pagewright server: application API, previews and live update streams
#[derive(Parser, Debug)]
#[command(name = "pagewright-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing pagewright.config.json
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Explicit config file, instead of looking in --config-dir
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_filter: Option<String>,

    /// Create an example application on startup
    #[arg(long)]
    seed: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_file(path)?,
            None => Config::load(&self.config_dir)?,
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(filter) = &self.log_filter {
            config.log_filter = filter.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.config().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let manager = VersionManager::new(
        Arc::new(InMemoryStore::new()),
        BroadcastHub::new(config.channel_capacity),
        Arc::new(CompileCache::new()),
    );
    if args.seed {
        let app = manager.create_application(NewApplication::new("demo", "Demo"))?;
        manager.publish(app.id)?;
        info!(app_id = %app.id, "Seeded demo application");
    }

    let address = config.address();
    let state = AppState {
        manager,
        config: Arc::new(config),
    };
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!(%address, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
