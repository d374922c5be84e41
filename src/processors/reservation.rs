//! Reservation Processors
//!
//! Allocation, release, consumption and expiry of pool keypairs. Every state
//! change is a compare-and-swap on the entry revision; a lost swap means some
//! other writer got there first and the operation moves on or re-reads.

use log::{debug, info, warn};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::sync::Arc;

use crate::{
    chain::ChainClient,
    constants::{ALLOCATION_SCAN_BATCH, MAX_ALLOCATION_ROUNDS},
    error::LaunchError,
    state::{EntryFilter, KeypairStore},
    types::{KeypairEntry, KeypairState},
    utils::TimeSource,
};

/// A successfully reserved entry together with its signing keypair.
pub struct ReservedKeypair {
    pub entry: KeypairEntry,
    signer: Keypair,
}

impl ReservedKeypair {
    fn from_entry(entry: KeypairEntry) -> Result<Self, LaunchError> {
        let signer = entry.signer()?;
        Ok(Self { entry, signer })
    }

    pub fn address(&self) -> Pubkey {
        self.entry.address
    }

    pub fn signer(&self) -> &Keypair {
        &self.signer
    }
}

/// Result of a release request. Every variant is a success for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// Not reserved (or not by this requester), nothing changed
    NoOp,
    NotFound,
}

pub struct ReservationManager {
    store: Arc<dyn KeypairStore>,
    clock: Arc<dyn TimeSource>,
    ttl_secs: i64,
    chain: Option<Arc<dyn ChainClient>>,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn KeypairStore>, clock: Arc<dyn TimeSource>, ttl_secs: i64) -> Self {
        Self {
            store,
            clock,
            ttl_secs,
            chain: None,
        }
    }

    /// Checks the chain before returning a reservation to the pool; a mint
    /// account that already exists retires the entry instead.
    pub fn with_chain(mut self, chain: Arc<dyn ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn store(&self) -> &Arc<dyn KeypairStore> {
        &self.store
    }

    /// Reserves one keypair for `requester`.
    ///
    /// Entries pinned to the requester are tried first, then the general pool
    /// in queue order. When nothing is eligible, expired reservations are swept
    /// once and allocation is retried before giving up.
    ///
    /// # Returns
    /// * `Result<ReservedKeypair, LaunchError>` - `NoAvailableKeypairs` when the pool is exhausted
    pub async fn allocate(&self, requester: &Pubkey) -> Result<ReservedKeypair, LaunchError> {
        if let Some(reserved) = self.try_allocate(requester).await? {
            return Ok(reserved);
        }

        let reclaimed = self.sweep_expired().await?;
        debug!("Pool empty for {}, lazy sweep reclaimed {}", requester, reclaimed);

        match self.try_allocate(requester).await? {
            Some(reserved) => Ok(reserved),
            None => {
                warn!("❌ No mint keypairs available for {}", requester);
                Err(LaunchError::NoAvailableKeypairs)
            }
        }
    }

    async fn candidates(&self, requester: &Pubkey) -> Result<Vec<KeypairEntry>, LaunchError> {
        let mut candidates: Vec<KeypairEntry> = self
            .store
            // Pins are per wallet and few; used ones must not crowd out live ones
            .scan(EntryFilter::AssignedTo(*requester), 0, usize::MAX)
            .await?
            .into_iter()
            .filter(|e| e.state == KeypairState::Assigned)
            .collect();
        candidates.extend(self.store.scan(EntryFilter::OpenPool, 0, ALLOCATION_SCAN_BATCH).await?);
        Ok(candidates)
    }

    async fn try_allocate(&self, requester: &Pubkey) -> Result<Option<ReservedKeypair>, LaunchError> {
        for round in 0..MAX_ALLOCATION_ROUNDS {
            let candidates = self.candidates(requester).await?;
            if candidates.is_empty() {
                return Ok(None);
            }

            for candidate in candidates {
                if !candidate.is_eligible_for(requester) {
                    continue;
                }
                if !candidate.is_consistent() {
                    warn!("Skipping pool entry {} with unreadable secret", candidate.address);
                    continue;
                }
                let next = candidate.reserved(*requester, self.clock.now());
                if self.store.compare_and_swap(&candidate, &next).await? {
                    info!(
                        "✅ Reserved {} for {} (queue position {})",
                        next.address, requester, next.queue_position
                    );
                    return ReservedKeypair::from_entry(next).map(Some);
                }
                debug!("Lost race for {} in round {}", candidate.address, round);
            }
        }
        Ok(None)
    }

    /// Returns a reserved keypair to the pool. Idempotent.
    pub async fn release(&self, address: &Pubkey) -> Result<ReleaseOutcome, LaunchError> {
        self.release_matching(address, None).await
    }

    /// Releases only when the reservation is held by `requester`.
    pub async fn release_for(&self, address: &Pubkey, requester: &Pubkey) -> Result<ReleaseOutcome, LaunchError> {
        self.release_matching(address, Some(requester)).await
    }

    async fn release_matching(
        &self,
        address: &Pubkey,
        requester: Option<&Pubkey>,
    ) -> Result<ReleaseOutcome, LaunchError> {
        for _ in 0..MAX_ALLOCATION_ROUNDS {
            let Some(entry) = self.store.get(address).await? else {
                return Ok(ReleaseOutcome::NotFound);
            };
            if entry.state != KeypairState::Reserved {
                return Ok(ReleaseOutcome::NoOp);
            }
            if let Some(requester) = requester {
                if entry.reserved_by.as_ref() != Some(requester) {
                    debug!("Release of {} by {} ignored, not the holder", address, requester);
                    return Ok(ReleaseOutcome::NoOp);
                }
            }
            match self.mint_landed(address).await {
                Some(false) => {}
                Some(true) => {
                    self.retire_landed(&entry).await?;
                    return Ok(ReleaseOutcome::NoOp);
                }
                None => return Ok(ReleaseOutcome::NoOp),
            }
            if self.store.compare_and_swap(&entry, &entry.released()).await? {
                info!("Released {}", address);
                return Ok(ReleaseOutcome::Released);
            }
        }
        warn!("Release of {} kept losing to concurrent writers", address);
        Ok(ReleaseOutcome::NoOp)
    }

    /// Consumes a reservation after its creation transaction confirmed.
    pub async fn mark_used(&self, address: &Pubkey) -> Result<(), LaunchError> {
        loop {
            let entry = self
                .store
                .get(address)
                .await?
                .ok_or(LaunchError::KeypairNotFound { mint: *address })?;
            match entry.state {
                KeypairState::Used => return Err(LaunchError::AlreadyUsed { mint: *address }),
                KeypairState::Reserved => {}
                _ => return Err(LaunchError::NotReserved { mint: *address }),
            }
            if self.store.compare_and_swap(&entry, &entry.used(self.clock.now())).await? {
                info!("✅ Marked {} used", address);
                return Ok(());
            }
        }
    }

    /// Forces an entry to `used` from any state.
    ///
    /// Used when the chain confirmed a creation but the reservation was swept
    /// or released in the meantime: the mint exists, so the keypair must never
    /// be handed out again.
    pub async fn settle_confirmed(&self, address: &Pubkey) -> Result<(), LaunchError> {
        loop {
            let entry = self
                .store
                .get(address)
                .await?
                .ok_or(LaunchError::KeypairNotFound { mint: *address })?;
            if entry.state == KeypairState::Used {
                return Ok(());
            }
            if self.store.compare_and_swap(&entry, &entry.used(self.clock.now())).await? {
                warn!("Settled {} as used from state {}", address, entry.state.as_str());
                return Ok(());
            }
        }
    }

    /// Reclaims every reservation older than the TTL. Returns how many were released.
    pub async fn sweep_expired(&self) -> Result<usize, LaunchError> {
        let now = self.clock.now();
        let reserved = self
            .store
            .scan(EntryFilter::State(KeypairState::Reserved), 0, usize::MAX)
            .await?;

        let mut reclaimed = 0;
        for entry in reserved {
            if !entry.is_reservation_expired(now, self.ttl_secs) {
                continue;
            }
            match self.mint_landed(&entry.address).await {
                Some(false) => {}
                Some(true) => {
                    self.retire_landed(&entry).await?;
                    continue;
                }
                // Unknown: keep it reserved until a later sweep can tell
                None => continue,
            }
            // A lost swap means the entry moved on (used, released or re-reserved)
            if self.store.compare_and_swap(&entry, &entry.released()).await? {
                debug!("Reclaimed expired reservation {} held by {:?}", entry.address, entry.reserved_by);
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            info!("Expiry sweep reclaimed {} keypairs", reclaimed);
        }
        Ok(reclaimed)
    }

    /// `Some(true)` when the mint account exists on chain, `None` when the
    /// lookup failed. Without a chain client every entry counts as not landed.
    async fn mint_landed(&self, address: &Pubkey) -> Option<bool> {
        let Some(chain) = &self.chain else {
            return Some(false);
        };
        match chain.account_exists(address).await {
            Ok(exists) => Some(exists),
            Err(e) => {
                warn!("Could not look up mint {} before release: {}", address, e);
                None
            }
        }
    }

    async fn retire_landed(&self, entry: &KeypairEntry) -> Result<(), LaunchError> {
        if self.store.compare_and_swap(entry, &entry.used(self.clock.now())).await? {
            warn!(
                "Mint {} exists on chain, retired instead of released (held by {:?})",
                entry.address, entry.reserved_by
            );
        }
        Ok(())
    }

    /// The active, unexpired reservation of `address` held by `requester`.
    pub async fn reservation(&self, address: &Pubkey, requester: &Pubkey) -> Result<ReservedKeypair, LaunchError> {
        let entry = self
            .store
            .get(address)
            .await?
            .ok_or(LaunchError::KeypairNotFound { mint: *address })?;
        if entry.state == KeypairState::Used {
            return Err(LaunchError::AlreadyUsed { mint: *address });
        }
        let held = entry.state == KeypairState::Reserved
            && entry.reserved_by.as_ref() == Some(requester)
            && !entry.is_reservation_expired(self.clock.now(), self.ttl_secs);
        if !held {
            return Err(LaunchError::KeypairExpired { mint: *address });
        }
        ReservedKeypair::from_entry(entry)
    }
}
