//! Report relay server entry point.

use report_relay::{create_router, AppState, Config};
use report_relay::server::shutdown_signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI args and .env file
    let config = Config::parse_args();

    let state = AppState::new(config.clone())?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("report-relay listening on http://{}", addr);
    info!("Model: {}", config.model);

    // Log the upstream safely (scheme and host only, never credentials or paths)
    let safe_upstream = match url::Url::parse(&config.upstream_url) {
        Ok(url) => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("unknown")),
        Err(_) => "invalid-url".to_string(),
    };
    info!("Upstream: {}", safe_upstream);
    info!(
        "Credential mode: {}",
        if config.require_user_key {
            "user-supplied"
        } else {
            "pool"
        }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
