//! envlog server binary.
//!
//! Reads `envlog.toml` (or the path given with `--config`), opens the SQLite
//! store, starts the sensor collector and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use envlog_api::AppState;
use envlog_server::{
  collector::Collector,
  sensor::IioSensor,
  settings::{self, ServerConfig},
};
use envlog_store_sqlite::SqliteStore;
use envlog_weather::OpenMeteoClient;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Environmental sensor logger")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "envlog.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg: ServerConfig = settings::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = settings::expand_tilde(&server_cfg.store_path);
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );
  info!(path = ?store_path, "store ready");

  let weather = OpenMeteoClient::new(server_cfg.weather.client_config())
    .context("failed to build weather client")?;

  if server_cfg.collector.enabled {
    let sensor = IioSensor::new(&server_cfg.collector.iio_device);
    info!(device = ?sensor.device(), "starting collector");
    let collector = Collector::new(sensor, store.clone(), server_cfg.collector.interval());
    tokio::spawn(collector.run());
  } else {
    info!("collector disabled");
  }

  let state = AppState::new(store, Arc::new(weather));
  let app = envlog_api::app(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }

  info!("shutdown signal received");
}
