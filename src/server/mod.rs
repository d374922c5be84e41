//! HTTP surface
//!
//! Thin axum layer over [`LaunchService`]: identity extraction, the admin
//! gate and error-to-status mapping. No pipeline logic lives here.

pub mod error;
pub mod identity;
pub mod routes;

use axum::{
    http::{
        header::{CONTENT_TYPE, RETRY_AFTER},
        HeaderName, Method,
    },
    routing::{get, post},
    Router,
};
use log::info;
use solana_program::pubkey::Pubkey;
use std::{collections::HashSet, io, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

use crate::processors::LaunchService;
pub use error::ErrorBody;
pub use identity::{GatewayHeaderVerifier, IdentityVerifier, WALLET_HEADER};
use routes::*;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LaunchService>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub admins: Arc<HashSet<Pubkey>>,
}

impl AppState {
    pub fn new(service: Arc<LaunchService>, verifier: Arc<dyn IdentityVerifier>, admins: HashSet<Pubkey>) -> Self {
        Self {
            service,
            verifier,
            admins: Arc::new(admins),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(WALLET_HEADER)])
        .expose_headers([RETRY_AFTER])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/token/prepare", post(prepare_handler))
        .route("/token/submit", post(submit_handler))
        .route("/token/release", post(release_handler))
        .route("/project/prepare", post(prepare_project_handler))
        .route("/project/submit-config", post(submit_project_config_handler))
        .route("/project/prepare-pool", post(prepare_pool_handler))
        .route("/mint-queue", get(queue_handler))
        .route("/mint-queue/my-assignments", get(my_assignments_handler))
        .route("/mint-queue/assign", post(assign_handler).delete(unassign_handler))
        .layer(cors)
        .with_state(state)
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, port: u16) -> io::Result<()> {
    let app = router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
