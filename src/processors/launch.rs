//! Launch Service
//!
//! Request-level orchestration of the creation flows. This is the surface
//! the HTTP layer calls; every method takes the verified requester identity.
//!
//! # Flows
//! - **Single step**: `prepare` → client signs → `submit`
//! - **Project**: `prepare_project` → `submit_project_config` →
//!   `prepare_pool` → client signs → `submit`
//! - `release` abandons either flow at any point

use log::{debug, info, warn};
use serde::Serialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;

use crate::{
    chain::ChainClient,
    constants::BLOCKHASH_VALIDITY_SECS,
    error::LaunchError,
    processors::{
        admin::AdminAssignments,
        assembler::{PreparedTransaction, TransactionAssembler},
        finalizer::{SubmissionFinalizer, SubmitRequest, Submission},
        reservation::{ReservationManager, ReservedKeypair},
    },
    state::{KeypairStore, PendingProjectStore, TokenRegistry},
    types::{LaunchParams, PendingProjectRecord, PlatformSettings, ProjectStage},
    utils::{
        to_rfc3339, validate_aux_metadata, validate_launch_params, RateAction, RateLimit, RateLimiter, TimeSource,
    },
};

/// Storage, network and clock the service runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub keypairs: Arc<dyn KeypairStore>,
    pub projects: Arc<dyn PendingProjectStore>,
    pub registry: Arc<dyn TokenRegistry>,
    pub chain: Arc<dyn ChainClient>,
    pub clock: Arc<dyn TimeSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub platform: PlatformSettings,
    pub reservation_ttl_secs: i64,
    pub pending_project_ttl_secs: i64,
    pub name_lock_window_secs: i64,
    pub prepare_limit: RateLimit,
    pub submit_limit: RateLimit,
}

/// Response of the prepare steps.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PreparedLaunch {
    pub serialized_tx: String,
    pub mint: String,
    /// Set for the project config step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_address: Option<String>,
    /// Unix seconds after which the embedded blockhash is likely stale
    pub expires_at: i64,
    /// Unix seconds after which the reserved mint returns to the pool
    pub reservation_expires_at: i64,
}

pub struct LaunchService {
    reservations: Arc<ReservationManager>,
    assembler: TransactionAssembler,
    finalizer: SubmissionFinalizer,
    admin: AdminAssignments,
    projects: Arc<dyn PendingProjectStore>,
    registry: Arc<dyn TokenRegistry>,
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn TimeSource>,
    rate_limiter: RateLimiter,
    settings: ServiceSettings,
}

impl LaunchService {
    pub fn new(collaborators: Collaborators, platform_signer: Keypair, settings: ServiceSettings) -> Self {
        let Collaborators {
            keypairs,
            projects,
            registry,
            chain,
            clock,
        } = collaborators;
        let platform = Arc::new(platform_signer);

        let reservations = Arc::new(
            ReservationManager::new(keypairs.clone(), clock.clone(), settings.reservation_ttl_secs)
                .with_chain(chain.clone()),
        );
        let assembler = TransactionAssembler::new(settings.platform.clone(), platform.clone());
        let finalizer = SubmissionFinalizer::new(
            reservations.clone(),
            projects.clone(),
            registry.clone(),
            chain.clone(),
            clock.clone(),
            settings.platform.clone(),
            platform,
            settings.name_lock_window_secs,
            settings.pending_project_ttl_secs,
        );

        Self {
            reservations,
            assembler,
            finalizer,
            admin: AdminAssignments::new(keypairs),
            projects,
            registry,
            chain,
            clock,
            rate_limiter: RateLimiter::new(settings.prepare_limit, settings.submit_limit),
            settings,
        }
    }

    pub fn reservations(&self) -> &Arc<ReservationManager> {
        &self.reservations
    }

    pub fn admin(&self) -> &AdminAssignments {
        &self.admin
    }

    pub fn registry(&self) -> &Arc<dyn TokenRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Checks shared by both prepare entry points, all before allocation.
    async fn admit(&self, params: &LaunchParams) -> Result<(), LaunchError> {
        validate_launch_params(params)?;
        let now = self.clock.now();
        self.rate_limiter.check(&params.creator, RateAction::Prepare, now)?;

        if let Some(conflict) = self
            .registry
            .find_conflict(&params.name, &params.symbol, now, self.settings.name_lock_window_secs)
            .await?
        {
            let value = if conflict.field == "name" {
                params.name.clone()
            } else {
                params.symbol.clone()
            };
            info!("Duplicate {} '{}' rejected for {}", conflict.field, value, params.creator);
            return Err(LaunchError::DuplicateToken {
                field: conflict.field.to_string(),
                value,
                existing_mint: conflict.record.mint,
            });
        }
        Ok(())
    }

    fn prepared(&self, tx: PreparedTransaction, reserved: &ReservedKeypair, config: Option<Pubkey>) -> PreparedLaunch {
        let reservation_expires_at = reserved
            .entry
            .reservation_expires_at(self.reservations.ttl_secs())
            .unwrap_or_default();
        debug!(
            "Prepared {} for {:?}, reservation valid until {}",
            reserved.address(),
            reserved.entry.reserved_by,
            to_rfc3339(reservation_expires_at)
        );
        PreparedLaunch {
            serialized_tx: tx.serialized_tx,
            mint: reserved.address().to_string(),
            config_address: config.map(|c| c.to_string()),
            expires_at: self.clock.now() + BLOCKHASH_VALIDITY_SECS,
            reservation_expires_at,
        }
    }

    /// Puts an allocated keypair back after a failure later in the same request.
    async fn unwind(&self, mint: &Pubkey, cause: &LaunchError) {
        debug!("Unwinding reservation {} after {}", mint, cause);
        if let Err(e) = self.reservations.release(mint).await {
            warn!("Could not release {} after failed prepare: {}", mint, e);
        }
    }

    /// Single-step launch: reserve a mint and return the partially signed creation transaction.
    pub async fn prepare(&self, params: LaunchParams) -> Result<PreparedLaunch, LaunchError> {
        self.admit(&params).await?;
        let reserved = self.reservations.allocate(&params.creator).await?;

        let result = async {
            let blockhash = self.chain.latest_blockhash().await?;
            self.assembler.build_creation_transaction(&params, &reserved, blockhash)
        }
        .await;

        match result {
            Ok(tx) => Ok(self.prepared(tx, &reserved, None)),
            Err(e) => {
                self.unwind(&reserved.address(), &e).await;
                Err(e)
            }
        }
    }

    pub async fn submit(&self, request: SubmitRequest, requester: &Pubkey) -> Result<Submission, LaunchError> {
        self.rate_limiter.check(requester, RateAction::Submit, self.clock.now())?;
        validate_aux_metadata(&request.aux_metadata)?;
        self.finalizer.submit(request, requester).await
    }

    /// Abandons a flow. Never fails: the reservation also expires on its own.
    pub async fn release(&self, mint: &Pubkey, requester: &Pubkey) {
        match self.reservations.release_for(mint, requester).await {
            Ok(outcome) => debug!("Release {} by {}: {:?}", mint, requester, outcome),
            Err(e) => warn!("Release {} by {} failed: {}", mint, requester, e),
        }
        match self.projects.get(mint).await {
            Ok(Some(record)) if record.creator() == requester => {
                if let Err(e) = self.projects.remove(mint).await {
                    warn!("Could not drop pending project {}: {}", mint, e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Pending project lookup for {} failed: {}", mint, e),
        }
    }

    /// First step of a project launch: reserve the mint and hand out the config transaction.
    pub async fn prepare_project(&self, params: LaunchParams) -> Result<PreparedLaunch, LaunchError> {
        self.admit(&params).await?;
        let reserved = self.reservations.allocate(&params.creator).await?;
        let config = Keypair::new();

        let result = async {
            let blockhash = self.chain.latest_blockhash().await?;
            let tx = self.assembler.build_config_transaction(&params, &config, blockhash)?;
            let record = PendingProjectRecord::new(reserved.address(), config.pubkey(), params.clone(), self.clock.now());
            self.projects.put(&record, self.settings.pending_project_ttl_secs).await?;
            Ok::<_, LaunchError>(tx)
        }
        .await;

        match result {
            Ok(tx) => {
                info!("Project session opened for {} (config {})", reserved.address(), config.pubkey());
                Ok(self.prepared(tx, &reserved, Some(config.pubkey())))
            }
            Err(e) => {
                self.unwind(&reserved.address(), &e).await;
                Err(e)
            }
        }
    }

    pub async fn submit_project_config(
        &self,
        request: SubmitRequest,
        requester: &Pubkey,
    ) -> Result<Submission, LaunchError> {
        self.rate_limiter.check(requester, RateAction::Submit, self.clock.now())?;
        self.finalizer.submit_config(request, requester).await
    }

    /// Second step of a project launch, recovered entirely from durable storage.
    pub async fn prepare_pool(
        &self,
        mint: &Pubkey,
        config_address: &Pubkey,
        requester: &Pubkey,
    ) -> Result<PreparedLaunch, LaunchError> {
        let expired = LaunchError::ProjectSessionExpired { mint: *mint };

        let record = self
            .finalizer
            .active_project(mint, requester)
            .await?
            .ok_or_else(|| expired.clone())?;
        if record.config_address != *config_address {
            return Err(LaunchError::validation("config_address", "does not match the project session"));
        }

        let reserved = match self.reservations.reservation(mint, requester).await {
            Ok(reserved) => reserved,
            Err(LaunchError::Storage(e)) => return Err(LaunchError::Storage(e)),
            Err(_) => return Err(expired),
        };

        if record.stage != ProjectStage::ConfigConfirmed && !self.chain.account_exists(config_address).await? {
            return Err(LaunchError::validation(
                "config_address",
                "project config is not confirmed on chain yet",
            ));
        }

        let blockhash = self.chain.latest_blockhash().await?;
        let tx = self.assembler.build_pool_transaction(&record, &reserved, blockhash)?;
        Ok(self.prepared(tx, &reserved, None))
    }
}
