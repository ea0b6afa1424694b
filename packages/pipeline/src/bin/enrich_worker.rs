use tracing_subscriber::EnvFilter;

use annotext_pipeline::config::WorkerConfig;
use annotext_pipeline::worker::run_enrich_worker;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    match run_enrich_worker(config).await {
        Ok(summary) => {
            if summary.failed > 0 {
                tracing::warn!(failed = summary.failed, "some documents were not annotated");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "enrich worker exited with error");
            std::process::exit(1);
        }
    }
}
