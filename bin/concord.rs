use clap::Parser;
use eyre::Result;

use concord::{client::Concord, config::Cli, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    telemetry::init(cli.verbose)?;
    telemetry::register_shutdown();

    let config = cli.to_config()?;

    // Run the claim verification service
    // This will block until complete, or erroring
    let concord = Concord::new(Some(config));
    match concord.start().await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!(target: "concord", "Concord exited with error: {}", e);
            Err(e)
        }
    }
}
