use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dao_shell::{providers::DaoInterpreterProvider, run_shell, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -v; logs go to stderr so program output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let interpreter = DaoInterpreterProvider::new(args.engine_config()?);
    run_shell(args, interpreter).await
}
