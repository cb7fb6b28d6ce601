//! Stop a test case on the simulation service by its identifier.

use clap::Parser;
use simbridge_client::{ClientConfig, HttpSimulationClient, SimulationService};

#[derive(Parser)]
#[command(name = "simbridge-stop")]
#[command(about = "Stop a test case on the simulation service")]
#[command(version)]
struct Cli {
    /// Identifier of the test case to stop
    case_id: String,

    /// Simulation service address
    #[arg(long, default_value = "http://localhost:5000")]
    remote: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let client = HttpSimulationClient::new(ClientConfig::new(cli.remote))?;
    client.stop(&cli.case_id).await?;
    println!("stopped test case {}", cli.case_id);

    Ok(())
}
