//! simbridge server
//!
//! Selects a test case on the remote simulation service, advances it on a
//! fixed cadence, and serves the point facade until interrupted.

use clap::Parser;
use simbridge_client::{HttpSimulationClient, SimulationService};
use simbridge_core::SimulationRunner;
use simbridge_facade::{serve, PointFacade};
use simbridge_server::{init_logging, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "simbridge-server")]
#[command(about = "Mirror a remote building simulation behind a point facade")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the test case
    #[arg(long)]
    case: Option<String>,

    /// Start time in seconds since the start of the year
    #[arg(long)]
    start: Option<u64>,

    /// Warm-up period in seconds
    #[arg(long)]
    warmup: Option<u64>,

    /// Simulated seconds to advance per update
    #[arg(long)]
    step: Option<u64>,

    /// Wall-clock interval between updates (e.g. "1s", "500ms")
    #[arg(long)]
    frequency: Option<humantime::Duration>,

    /// Simulation service address
    #[arg(long)]
    remote: Option<String>,

    /// Facade listen address
    #[arg(long)]
    listen: Option<String>,

    /// Scheme of external point addresses
    #[arg(long)]
    scheme: Option<String>,

    /// Wait for POST /run/start instead of starting immediately
    #[arg(long)]
    no_auto_start: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(case) = self.case {
            config.test_case = case;
        }
        if let Some(start) = self.start {
            config.start_time = start;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_period = warmup;
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(frequency) = self.frequency {
            config.update_frequency = frequency;
        }
        if let Some(remote) = self.remote {
            config.remote_addr = remote;
        }
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if self.no_auto_start {
            config.auto_start = false;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
    }
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(err) => {
            warn!(error = %err, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let _log_guard = init_logging(config.log_file.as_deref())?;

    let client: Arc<dyn SimulationService> =
        Arc::new(HttpSimulationClient::new(config.client_config())?);
    let test_case = config.test_case_config();
    let runner = Arc::new(SimulationRunner::connect(client, test_case).await?);

    let result = run(&config, Arc::clone(&runner)).await;
    // The case never outlives the process, started or not.
    runner.release().await;
    result
}

/// Start the run if configured and serve the facade until shutdown.
async fn run(config: &ServerConfig, runner: Arc<SimulationRunner>) -> anyhow::Result<()> {
    if runner.config().auto_start {
        if let Err(err) = runner.start().await {
            error!(error = %err, "Failed to start simulation");
            return Err(err.into());
        }
    }

    let listener = TcpListener::bind(&config.listen_addr).await?;
    let facade = Arc::new(PointFacade::new(Arc::clone(&runner), config.scheme.clone()));
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, facade, shutdown.clone()));

    info!(
        test_case = %config.test_case,
        case_id = runner.case_id(),
        listen_addr = %config.listen_addr,
        "Server running, press ctrl+c to exit"
    );

    let mut states = runner.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        _ = terminate_signal() => info!("Terminated, shutting down"),
        _ = states.wait_for(|state| state.is_terminal()) => {
            warn!("Simulation run ended, shutting down");
        }
    }

    runner.stop().await;
    shutdown.cancel();
    server.await??;

    Ok(())
}
