use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pitview::client::runtime::start_client;
use pitview::config::ClientConfig;
use pitview::transport::sim::SimTransport;
use pitview::tui::run::run_tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so they do not fight the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let transport = Arc::new(SimTransport::new());
    let client = start_client(transport, ClientConfig::default());

    run_tui(client.sender()).await
}
