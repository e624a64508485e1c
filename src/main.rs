use apiform::cli::{run_cli, Cli};
use apiform::logging::{init_logging_with_config, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}
