use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cursorboard::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cursorboard=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();

    match cursorboard::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "cursorboard failed");
            ExitCode::FAILURE
        }
    }
}
