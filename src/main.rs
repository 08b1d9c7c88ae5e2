use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use keystone::server;
use keystone::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("keystone: {e}");
            return ExitCode::FAILURE;
        }
    };
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = server::serve(&settings).await {
        error!(error = %e, "keystone failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
