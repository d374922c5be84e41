//! Keypair Pool Store
//!
//! Storage boundary for the keypair pool. Every state change is a single
//! compare-and-swap keyed on the entry revision; callers never read-then-write
//! without it. This is the only place the at-most-one-reservation guarantee is
//! enforced, so implementations must make `compare_and_swap` atomic with
//! respect to every other writer, including other processes.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::collections::BTreeMap;

use crate::{
    error::StoreError,
    types::{KeypairEntry, KeypairState},
};

/// Selection used by scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    All,
    /// `Available` entries with no admin pin
    OpenPool,
    /// Entries pinned to one identity, whatever their state
    AssignedTo(Pubkey),
    State(KeypairState),
}

impl EntryFilter {
    pub fn matches(&self, entry: &KeypairEntry) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::OpenPool => entry.state == KeypairState::Available && entry.assigned_to.is_none(),
            EntryFilter::AssignedTo(identity) => entry.assigned_to.as_ref() == Some(identity),
            EntryFilter::State(state) => entry.state == *state,
        }
    }
}

#[async_trait]
pub trait KeypairStore: Send + Sync {
    /// Adds a freshly provisioned entry. Fails if the address already exists.
    async fn insert(&self, entry: KeypairEntry) -> Result<(), StoreError>;

    async fn get(&self, address: &Pubkey) -> Result<Option<KeypairEntry>, StoreError>;

    /// Replaces `current` with `next` only if the stored revision still equals
    /// `current.version`. Returns `false` when another writer got there first
    /// or the entry is gone.
    async fn compare_and_swap(&self, current: &KeypairEntry, next: &KeypairEntry) -> Result<bool, StoreError>;

    /// Entries matching `filter`, ordered by queue position.
    async fn scan(&self, filter: EntryFilter, offset: usize, limit: usize) -> Result<Vec<KeypairEntry>, StoreError>;

    async fn count(&self, filter: EntryFilter) -> Result<usize, StoreError>;
}

/// Provisions `count` freshly generated keypairs starting at `first_position`.
pub async fn seed_generated(
    store: &dyn KeypairStore,
    count: usize,
    first_position: u64,
) -> Result<Vec<Pubkey>, StoreError> {
    let mut addresses = Vec::with_capacity(count);
    for offset in 0..count as u64 {
        let keypair = Keypair::new();
        store.insert(KeypairEntry::new(&keypair, first_position + offset)).await?;
        addresses.push(keypair.pubkey());
    }
    Ok(addresses)
}

/// Single-process store for local development and tests.
///
/// Atomic within one process only; production deployments use the Redis store.
#[derive(Default)]
pub struct MemoryKeypairStore {
    entries: RwLock<BTreeMap<Pubkey, KeypairEntry>>,
}

impl MemoryKeypairStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeypairStore for MemoryKeypairStore {
    async fn insert(&self, entry: KeypairEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.address) {
            return Err(StoreError::AlreadyExists(entry.address.to_string()));
        }
        entries.insert(entry.address, entry);
        Ok(())
    }

    async fn get(&self, address: &Pubkey) -> Result<Option<KeypairEntry>, StoreError> {
        Ok(self.entries.read().get(address).cloned())
    }

    async fn compare_and_swap(&self, current: &KeypairEntry, next: &KeypairEntry) -> Result<bool, StoreError> {
        if current.address != next.address {
            return Ok(false);
        }
        let mut entries = self.entries.write();
        match entries.get_mut(&current.address) {
            Some(stored) if stored.version == current.version => {
                *stored = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn scan(&self, filter: EntryFilter, offset: usize, limit: usize) -> Result<Vec<KeypairEntry>, StoreError> {
        let entries = self.entries.read();
        let mut matching: Vec<&KeypairEntry> = entries.values().filter(|e| filter.matches(e)).collect();
        matching.sort_by_key(|e| (e.queue_position, e.address));
        Ok(matching.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, filter: EntryFilter) -> Result<usize, StoreError> {
        Ok(self.entries.read().values().filter(|e| filter.matches(e)).count())
    }
}
