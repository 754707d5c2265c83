use std::sync::Arc;

use anyhow::Result;
use ratewall::config::Config;
use ratewall::limiter::RateLimiter;
use ratewall::redis::{RedisStore, Store};
use ratewall::script::ScriptRegistry;
use ratewall::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratewall=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ratewall service");
    tracing::info!(
        "Configuration: bind_addr={}, redis_url={}, algorithm={}, window={:?}, max_requests={}",
        config.bind_addr,
        config.redis_url,
        config.algorithm,
        config.window(),
        config.max_requests
    );

    // Startup is fatal without a working store: connect, then make sure the
    // decision script is registered before serving.
    let store: Arc<dyn Store> = Arc::new(
        RedisStore::connect(&config.redis_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?,
    );

    let registry = Arc::new(ScriptRegistry::new(Arc::clone(&store), config.algorithm));
    registry
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to register decision script: {}", e))?;

    let reload = registry.clone().spawn_reload(config.reload_interval());

    let engine = RateLimiter::with_system_clock(store, registry);
    let server = Server::new(config, engine);

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    reload.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
