pub mod handlers;
pub mod rate_limit;
pub mod types;

pub use rate_limit::{RateLimiter, RateSpec};

use crate::{Result, config::Config, gateway::HuggingFaceGateway};
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::any};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Builds the application router. Rate limiting sits inside CORS so preflight
/// requests are answered without spending a token. Bodies larger than
/// `body_limit` bytes are rejected with a JSON error.
pub fn router(
    state: handlers::AppState,
    limiter: Arc<RateLimiter>,
    body_limit: usize,
) -> Router {
    Router::new()
        .route("/:task/", any(handlers::process_text))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::limit_by_ip,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run(config: Config) -> Result<()> {
    let rate: RateSpec = config.server.rate_limit.parse()?;
    let gateway = HuggingFaceGateway::new(config.upstream.clone())?;

    let app_state = handlers::AppState {
        gateway: Arc::new(gateway),
    };
    let app = router(
        app_state,
        Arc::new(RateLimiter::new(rate)),
        config.server.max_body_bytes,
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!(
        "Starting server on {} (rate limit {} per {}s)",
        addr,
        rate.count,
        rate.period.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
