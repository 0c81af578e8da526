mod args;
mod output;
mod runner;

use anyhow::Result;
use clap::Parser;

use args::Cli;
use httpscan_telemetry::init_logging;
use runner::{run_create, run_scan};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    init_logging(cli.verbose, log_file)?;

    if cli.definitions_create {
        run_create(&cli).await
    } else {
        run_scan(&cli).await
    }
}
