use query_router::{api::start_server, QueryRouter, RouterConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RouterConfig::from_env()?;

    info!("Conversational Query Router - API Server");
    info!("Port: {}", config.api_port);
    info!("Search providers: {:?}", config.search_providers);

    let router = Arc::new(QueryRouter::new(&config)?);

    info!("Router initialized, starting API server...");

    start_server(router, config.api_port).await?;

    Ok(())
}
