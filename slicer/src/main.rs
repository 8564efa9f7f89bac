use clap::Parser;
use slicer_core::slicer_error;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Args;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = commands::execute(args).await {
        slicer_error!("Error: {e}");
        std::process::exit(1);
    }
}
