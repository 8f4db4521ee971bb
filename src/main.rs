use ferry::commands::Cli;
use ferry::libs::messages::macros::is_debug_mode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Terminal mode shows messages only; debug mode streams the structured log instead.
    let default_filter = if is_debug_mode() { "ferry=info" } else { "off" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Cli::menu().await
}
