use gallows::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    Config::init()?;
    let config = Config::get();

    tracing_subscriber::registry()
        .with(EnvFilter::new(config.log_filter()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("configuration loaded: {:?}", config);

    let server = GameServer::new().await;

    let http_addr = config.http_addr().to_string();
    let ws_addr = config.ws_addr().to_string();

    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("WebSocket server listening on {}", ws_addr);

    server.start_http_server(&http_addr).await?;

    server.start_ws_server(&ws_addr).await?;

    Ok(())
}
