use clap::Parser;
use tracing_subscriber::EnvFilter;

use amr_engine::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let cli = Cli::parse();
    let output = cli::run(cli)?;
    println!("{output}");
    Ok(())
}
