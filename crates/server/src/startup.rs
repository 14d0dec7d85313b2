use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::auth::TokenService;
use service::runtime;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Open the file-backed stores and assemble the shared handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<auth::ServerState, StartupError> {
    let stores = runtime::open_file_stores(&cfg.storage.data_dir, cfg.listings.max_image_url_len)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    Ok(auth::ServerState {
        identity: stores.identity,
        listings: stores.listings,
        revocations: stores.revocations,
        tokens: TokenService::new(&cfg.auth.jwt_secret, cfg.auth.token_ttl_hours),
    })
}

/// Full application router for `state`.
pub fn build_app(state: auth::ServerState, cfg: &AppConfig) -> Router {
    routes::build_router(state, build_cors(), cfg.listings.max_image_url_len)
}

/// Serve `app` on `listener` until Ctrl+C.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
            }
        })
        .await?;
    Ok(())
}

/// Public entry: build the app from `cfg` and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    if cfg.auth.uses_dev_secret() {
        warn!("JWT_SECRET not configured; using the development secret");
    }

    let state = build_state(&cfg).await?;
    let app = build_app(state, &cfg);

    let addr = bind_addr(&cfg)?;
    info!(%addr, data_dir = %cfg.storage.data_dir.display(), "starting rentpal server");
    let listener = TcpListener::bind(addr).await?;
    serve(listener, app).await
}
