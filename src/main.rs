use log::{error, info, warn};
use std::{process::ExitCode, sync::Arc, time::Duration};

use launchpad_mint_pool::{
    chain::RpcChainClient,
    config::Config,
    processors::{Collaborators, LaunchService, ReservationManager},
    server::{self, AppState, GatewayHeaderVerifier},
    state::RedisStore,
    utils::SystemTimeSource,
};

/// Periodically returns expired reservations to the pool.
fn spawn_sweeper(reservations: Arc<ReservationManager>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = reservations.sweep_expired().await {
                warn!("Expiry sweep failed: {}", e);
            }
        }
    });
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let platform_signer = config.load_platform_signer()?;
    info!("Platform authority loaded");

    let store = Arc::new(RedisStore::connect(&config.redis_url, &config.key_prefix).await?);
    info!("Connected to Redis with key prefix '{}'", config.key_prefix);

    let chain = Arc::new(RpcChainClient::new(
        &config.rpc_url,
        Duration::from_secs(config.confirm_timeout_secs),
    ));
    info!("Using RPC endpoint {}", config.rpc_url);

    let collaborators = Collaborators {
        keypairs: store.clone(),
        projects: store.clone(),
        registry: store,
        chain,
        clock: Arc::new(SystemTimeSource),
    };
    let service = Arc::new(LaunchService::new(collaborators, platform_signer, config.service_settings()));

    spawn_sweeper(service.reservations().clone(), config.sweep_interval_secs);

    let state = AppState::new(service, Arc::new(GatewayHeaderVerifier::default()), config.admin_wallets.clone());
    server::serve(state, config.port).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
