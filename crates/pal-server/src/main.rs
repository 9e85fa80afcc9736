//! Binary entrypoint for the Pal floor-control server.
//!
//! Configuration comes from `PAL_*` environment variables (see
//! [`ServerConfig::from_env`]); log filtering from `RUST_LOG`.

use pal_server::config::ServerConfig;
use pal_server::router::build_router;
use pal_server::state::AppState;
use pal_server::sweeper::start_sweeper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let addr = config.addr();

    let state = AppState::new(config);
    start_sweeper(state.clone());

    let app = build_router(state);

    tracing::info!("pal server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
