use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG`, when set and valid, overrides `--log-level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = awesome_foamlib::cli::parse_cli();
    init_tracing(&cli.log_level);
    awesome_foamlib::cli::run_with_cli(cli).await
}
