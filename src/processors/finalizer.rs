//! Submission Processors
//!
//! Validates a client-returned transaction, restores the server-side
//! signatures, submits it and records the outcome. A failed submission never
//! consumes the reservation.

use borsh::BorshDeserialize;
use log::{error, info, warn};
use solana_program::pubkey::Pubkey;
use solana_sdk::{
    sanitize::Sanitize,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::{collections::HashSet, sync::Arc};

use crate::{
    chain::ChainClient,
    constants::MEMO_PROGRAM_ID,
    error::LaunchError,
    processors::{allowed_programs, reservation::ReservationManager},
    state::{PendingProjectStore, TokenRegistry},
    types::{LaunchInstruction, PendingProjectRecord, PlatformSettings, ProjectStage, TokenRecord},
    utils::{decode_transaction, TimeSource},
};

/// A signed creation transaction returned by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub signed_tx: String,
    pub mint: Pubkey,
    /// Optional layout/page references, attached best-effort after confirmation
    pub aux_metadata: Vec<String>,
}

/// A confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub mint: Pubkey,
    pub signature: Signature,
}

/// What a returned transaction must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    /// Mint creation plus `CreatePool` against `config`
    Pool { mint: Pubkey, config: Pubkey },
    /// Project `CreateConfig` only
    Config { config: Pubkey },
}

impl ExpectedShape {
    fn server_signer(&self) -> Pubkey {
        match self {
            ExpectedShape::Pool { mint, .. } => *mint,
            ExpectedShape::Config { config } => *config,
        }
    }
}

/// Name and symbol carried by a validated `CreatePool` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolIdentity {
    pub name: String,
    pub symbol: String,
}

/// Structural checks on a returned transaction.
///
/// The client may only add its own signature: the fee payer must be the
/// requester, the signer set must be exactly requester, platform and the
/// server-held keypair, every instruction must target an allow-listed program,
/// the platform memo must be present and exactly one launchpad instruction of
/// the expected kind must reference the expected accounts.
///
/// # Returns
/// * `Result<Option<PoolIdentity>, LaunchError>` - the pool name and symbol for
///   `ExpectedShape::Pool`, `None` for config transactions
pub fn validate_message(
    transaction: &Transaction,
    settings: &PlatformSettings,
    platform: &Pubkey,
    requester: &Pubkey,
    shape: &ExpectedShape,
) -> Result<Option<PoolIdentity>, LaunchError> {
    transaction
        .sanitize()
        .map_err(|e| LaunchError::validation("signed_tx", format!("malformed transaction: {}", e)))?;

    let message = &transaction.message;
    let keys = &message.account_keys;
    if keys.first() != Some(requester) {
        return Err(LaunchError::validation("signed_tx", "fee payer must be the requesting wallet"));
    }

    let signer_count = message.header.num_required_signatures as usize;
    let signers: HashSet<&Pubkey> = keys.iter().take(signer_count).collect();
    let expected: HashSet<Pubkey> = [*requester, *platform, shape.server_signer()].into_iter().collect();
    if signer_count != expected.len() || !expected.iter().all(|k| signers.contains(k)) {
        return Err(LaunchError::validation("signed_tx", "unexpected signer set"));
    }

    let allowed = allowed_programs(settings);
    let mut memo_found = false;
    let mut pool: Option<PoolIdentity> = None;
    let mut launchpad_calls = 0usize;

    for ix in &message.instructions {
        let program_id = keys
            .get(ix.program_id_index as usize)
            .ok_or_else(|| LaunchError::validation("signed_tx", "program index out of range"))?;
        if !allowed.contains(program_id) {
            return Err(LaunchError::validation(
                "signed_tx",
                format!("program {} is not allowed", program_id),
            ));
        }
        if *program_id == MEMO_PROGRAM_ID && settings.is_platform_memo(&ix.data) {
            memo_found = true;
        }
        if *program_id != settings.launchpad_program_id {
            continue;
        }

        let account = |i: usize| ix.accounts.get(i).and_then(|a| keys.get(*a as usize));
        let instruction = LaunchInstruction::try_from_slice(&ix.data)
            .map_err(|_| LaunchError::validation("signed_tx", "undecodable launchpad instruction"))?;
        match (instruction, shape) {
            (LaunchInstruction::CreatePool { name, symbol, .. }, ExpectedShape::Pool { mint, config }) => {
                launchpad_calls += 1;
                if account(0) != Some(mint) || account(3) != Some(config) {
                    return Err(LaunchError::validation("signed_tx", "CreatePool references the wrong accounts"));
                }
                pool = Some(PoolIdentity { name, symbol });
            }
            (LaunchInstruction::Buy { .. }, ExpectedShape::Pool { mint, .. }) => {
                if account(0) != Some(mint) || account(1) != Some(requester) {
                    return Err(LaunchError::validation("signed_tx", "Buy references the wrong accounts"));
                }
            }
            (LaunchInstruction::CreateConfig { .. }, ExpectedShape::Config { config }) => {
                launchpad_calls += 1;
                if account(0) != Some(config) {
                    return Err(LaunchError::validation("signed_tx", "CreateConfig references the wrong config"));
                }
            }
            _ => {
                return Err(LaunchError::validation("signed_tx", "unexpected launchpad instruction"));
            }
        }
    }

    if !memo_found {
        return Err(LaunchError::validation("signed_tx", "platform memo missing"));
    }
    if launchpad_calls != 1 {
        return Err(LaunchError::validation(
            "signed_tx",
            format!("expected exactly one launchpad creation instruction, found {}", launchpad_calls),
        ));
    }
    Ok(pool)
}

/// Re-attaches server-side signatures the client dropped, then verifies every slot.
///
/// A server signature that is present but does not verify means the message
/// was altered after signing, so it is rejected rather than overwritten.
pub fn restore_signatures(transaction: &mut Transaction, signers: &[&Keypair]) -> Result<(), LaunchError> {
    let signer_count = transaction.message.header.num_required_signatures as usize;
    if transaction.signatures.len() != signer_count {
        return Err(LaunchError::InvalidSignature {
            reason: format!("expected {} signatures, found {}", signer_count, transaction.signatures.len()),
        });
    }

    let message_data = transaction.message_data();
    for signer in signers {
        let pubkey = signer.pubkey();
        let index = transaction.message.account_keys[..signer_count]
            .iter()
            .position(|k| *k == pubkey)
            .ok_or_else(|| LaunchError::InvalidSignature {
                reason: format!("{} is not a required signer", pubkey),
            })?;
        let present = transaction.signatures[index];
        if present != Signature::default() && !present.verify(pubkey.as_ref(), &message_data) {
            return Err(LaunchError::InvalidSignature {
                reason: format!("signature for {} does not match the message", pubkey),
            });
        }
    }

    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_partial_sign(signers, blockhash)
        .map_err(|e| LaunchError::Signing { reason: e.to_string() })?;
    transaction
        .verify()
        .map_err(|e| LaunchError::InvalidSignature { reason: e.to_string() })
}

pub struct SubmissionFinalizer {
    reservations: Arc<ReservationManager>,
    projects: Arc<dyn PendingProjectStore>,
    registry: Arc<dyn TokenRegistry>,
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn TimeSource>,
    settings: PlatformSettings,
    platform: Arc<Keypair>,
    name_lock_window_secs: i64,
    pending_project_ttl_secs: i64,
}

impl SubmissionFinalizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reservations: Arc<ReservationManager>,
        projects: Arc<dyn PendingProjectStore>,
        registry: Arc<dyn TokenRegistry>,
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn TimeSource>,
        settings: PlatformSettings,
        platform: Arc<Keypair>,
        name_lock_window_secs: i64,
        pending_project_ttl_secs: i64,
    ) -> Self {
        Self {
            reservations,
            projects,
            registry,
            chain,
            clock,
            settings,
            platform,
            name_lock_window_secs,
            pending_project_ttl_secs,
        }
    }

    /// The unexpired pending project for `mint` owned by `requester`, if any.
    pub async fn active_project(
        &self,
        mint: &Pubkey,
        requester: &Pubkey,
    ) -> Result<Option<PendingProjectRecord>, LaunchError> {
        let record = self.projects.get(mint).await?;
        Ok(record.filter(|r| {
            r.creator() == requester && !r.is_expired(self.clock.now(), self.pending_project_ttl_secs)
        }))
    }

    async fn send(&self, transaction: &Transaction, mint: &Pubkey) -> Result<Signature, LaunchError> {
        self.chain.send_and_confirm(transaction).await.map_err(|e| {
            let classified = LaunchError::from(e);
            warn!("❌ Submission for {} failed: {} ({})", mint, classified, classified.code());
            classified
        })
    }

    /// Finalizes a mint creation (single-step launch or project pool step).
    pub async fn submit(&self, request: SubmitRequest, requester: &Pubkey) -> Result<Submission, LaunchError> {
        let mut transaction = decode_transaction(&request.signed_tx)?;
        let reserved = self.reservations.reservation(&request.mint, requester).await?;
        let project = self.active_project(&request.mint, requester).await?;

        let config = project
            .as_ref()
            .map(|p| p.config_address)
            .unwrap_or(self.settings.platform_config);
        let shape = ExpectedShape::Pool { mint: request.mint, config };
        let identity = validate_message(&transaction, &self.settings, &self.platform.pubkey(), requester, &shape)?
            .ok_or_else(|| LaunchError::validation("signed_tx", "CreatePool missing"))?;

        // Another launch may have claimed the name since prepare
        if let Some(conflict) = self
            .registry
            .find_conflict(&identity.name, &identity.symbol, self.clock.now(), self.name_lock_window_secs)
            .await?
        {
            return Err(LaunchError::DuplicateToken {
                field: conflict.field.to_string(),
                value: if conflict.field == "name" { identity.name } else { identity.symbol },
                existing_mint: conflict.record.mint,
            });
        }

        restore_signatures(&mut transaction, &[reserved.signer(), &*self.platform])?;

        // A retry of a transaction that already landed must not be sent again
        if self.mint_exists(&request.mint).await {
            warn!("Mint {} already on chain, settling the earlier submission", request.mint);
            return Ok(self.settle_landed(&request, requester, identity, &transaction).await);
        }

        let signature = match self.send(&transaction, &request.mint).await {
            Ok(signature) => signature,
            Err(e @ (LaunchError::SubmissionTimeout | LaunchError::NetworkFailure { .. })) => {
                if !self.mint_exists(&request.mint).await {
                    return Err(e);
                }
                warn!("Submission for {} reported {} but the mint exists", request.mint, e.code());
                return Ok(self.settle_landed(&request, requester, identity, &transaction).await);
            }
            Err(e) => return Err(e),
        };
        info!("✅ Token {} created: {}", request.mint, signature);

        self.record_creation(&request, requester, identity).await;
        Ok(Submission {
            mint: request.mint,
            signature,
        })
    }

    async fn mint_exists(&self, mint: &Pubkey) -> bool {
        match self.chain.account_exists(mint).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not look up mint {} on chain: {}", mint, e);
                false
            }
        }
    }

    /// Bookkeeping for a creation whose confirmation was lost in transit.
    async fn settle_landed(
        &self,
        request: &SubmitRequest,
        requester: &Pubkey,
        identity: PoolIdentity,
        transaction: &Transaction,
    ) -> Submission {
        let signature = transaction.signatures.first().copied().unwrap_or_default();
        info!("✅ Token {} created: {} (confirmed by account lookup)", request.mint, signature);
        self.record_creation(request, requester, identity).await;
        Submission {
            mint: request.mint,
            signature,
        }
    }

    /// Post-confirmation bookkeeping. The token exists on chain at this point,
    /// so nothing here may fail the request.
    async fn record_creation(&self, request: &SubmitRequest, requester: &Pubkey, identity: PoolIdentity) {
        let mint = &request.mint;
        if let Err(e) = self.reservations.mark_used(mint).await {
            warn!("mark_used for {} failed ({}), settling", mint, e);
            if let Err(e) = self.reservations.settle_confirmed(mint).await {
                error!("Could not retire confirmed mint {}: {}", mint, e);
            }
        }

        if let Err(e) = self.projects.remove(mint).await {
            warn!("Could not drop pending project {}: {}", mint, e);
        }

        let record = TokenRecord {
            mint: *mint,
            name: identity.name,
            symbol: identity.symbol,
            creator: *requester,
            created_at: self.clock.now(),
            graduated: false,
            aux_metadata: Vec::new(),
        };
        if let Err(e) = self.registry.register(record).await {
            error!("Token {} confirmed but not registered: {}", mint, e);
            return;
        }

        if !request.aux_metadata.is_empty() {
            if let Err(e) = self.registry.attach_metadata(mint, &request.aux_metadata).await {
                warn!("Auxiliary metadata for {} dropped: {}", mint, e);
            }
        }
    }

    /// Finalizes the config step of a project launch. Never consumes the reservation.
    pub async fn submit_config(&self, request: SubmitRequest, requester: &Pubkey) -> Result<Submission, LaunchError> {
        let mut transaction = decode_transaction(&request.signed_tx)?;
        let mut record = self
            .active_project(&request.mint, requester)
            .await?
            .ok_or(LaunchError::ProjectSessionExpired { mint: request.mint })?;
        self.reservations.reservation(&request.mint, requester).await?;

        let shape = ExpectedShape::Config {
            config: record.config_address,
        };
        validate_message(&transaction, &self.settings, &self.platform.pubkey(), requester, &shape)?;
        restore_signatures(&mut transaction, &[&*self.platform])?;

        let signature = self.send(&transaction, &request.mint).await?;
        info!("✅ Project config {} confirmed for {}", record.config_address, request.mint);

        record.stage = ProjectStage::ConfigConfirmed;
        let remaining = record.created_at + self.pending_project_ttl_secs - self.clock.now();
        if let Err(e) = self.projects.put(&record, remaining).await {
            // prepare_pool falls back to an on-chain existence check
            warn!("Could not persist config confirmation for {}: {}", request.mint, e);
        }

        Ok(Submission {
            mint: request.mint,
            signature,
        })
    }
}
