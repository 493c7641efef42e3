use anyhow::Result;
use reqwest::Client;
use stockpicker::{
    config::Config,
    engine::resolve_run_url,
    proxy::{self, ProxyState},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;
use warp::Filter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let upstream = Url::parse(&resolve_run_url(config.upstream_url.as_str()))?;
    info!(upstream = %upstream, "Starting stock picker proxy");

    let state = ProxyState {
        client: Client::new(),
        upstream,
    };
    let routes = proxy::health().or(proxy::routes(state));

    info!("Server starting on port {}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!(
        "Proxy endpoint: POST http://localhost:{}/api/proxy/stock-picker/run",
        config.port
    );

    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
