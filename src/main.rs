//! Vitals Stream - Binary Entry Point
//!
//! This is the main entry point for the vitals-generator binary.

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vitals_stream::cli::Cli;
use vitals_stream::sinks::build_sink;
use vitals_stream::simulator::Simulator;
use vitals_stream::types::SimResult;

#[tokio::main]
async fn main() -> SimResult<()> {
    // Logs go to stderr so console output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    info!(
        patients = config.patient_count,
        output = %config.output,
        seed = ?config.seed,
        "starting {} {}",
        vitals_stream::NAME,
        vitals_stream::VERSION
    );

    let sink = build_sink(&config.output).await?;
    let simulator = Simulator::from_config(&config, sink);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    simulator.run(shutdown_rx).await;
    Ok(())
}
