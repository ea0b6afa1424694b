//! CLI entry point for annotext.

use annotext_pipeline::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // WARN by default so progress output stays readable; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    if let Err(e) = cli::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
