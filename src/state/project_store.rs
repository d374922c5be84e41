//! Pending project session storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_program::pubkey::Pubkey;
use std::{collections::HashMap, sync::Arc};

use crate::{
    error::StoreError,
    types::PendingProjectRecord,
    utils::{SystemTimeSource, TimeSource},
};

#[async_trait]
pub trait PendingProjectStore: Send + Sync {
    /// Inserts or replaces the record for `record.mint`, expiring it after `ttl_secs`.
    async fn put(&self, record: &PendingProjectRecord, ttl_secs: i64) -> Result<(), StoreError>;

    async fn get(&self, mint: &Pubkey) -> Result<Option<PendingProjectRecord>, StoreError>;

    async fn remove(&self, mint: &Pubkey) -> Result<(), StoreError>;
}

/// In-process session table. Each record carries a deadline of
/// `now + ttl_secs` at write time; expired records are dropped on access.
pub struct MemoryProjectStore {
    records: RwLock<HashMap<Pubkey, (PendingProjectRecord, i64)>>,
    clock: Arc<dyn TimeSource>,
}

impl Default for MemoryProjectStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PendingProjectStore for MemoryProjectStore {
    async fn put(&self, record: &PendingProjectRecord, ttl_secs: i64) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut records = self.records.write();
        records.retain(|_, (_, deadline)| *deadline > now);
        records.insert(record.mint, (record.clone(), now.saturating_add(ttl_secs.max(1))));
        Ok(())
    }

    async fn get(&self, mint: &Pubkey) -> Result<Option<PendingProjectRecord>, StoreError> {
        let now = self.clock.now();
        let mut records = self.records.write();
        match records.get(mint) {
            Some((record, deadline)) if *deadline > now => Ok(Some(record.clone())),
            Some(_) => {
                records.remove(mint);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, mint: &Pubkey) -> Result<(), StoreError> {
        self.records.write().remove(mint);
        Ok(())
    }
}
