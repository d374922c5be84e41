//! Token registry
//!
//! Relational-side bookkeeping for created tokens: duplicate-name checks and
//! best-effort auxiliary metadata.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_program::pubkey::Pubkey;
use std::collections::HashMap;

use crate::{error::StoreError, types::TokenRecord};

/// A recent launch that blocks a new name or symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict {
    pub field: &'static str,
    pub record: TokenRecord,
}

#[async_trait]
pub trait TokenRegistry: Send + Sync {
    async fn find_conflict(
        &self,
        name: &str,
        symbol: &str,
        now: i64,
        lock_window_secs: i64,
    ) -> Result<Option<NameConflict>, StoreError>;

    async fn register(&self, record: TokenRecord) -> Result<(), StoreError>;

    async fn get(&self, mint: &Pubkey) -> Result<Option<TokenRecord>, StoreError>;

    /// Appends layout/page references to an existing record.
    async fn attach_metadata(&self, mint: &Pubkey, refs: &[String]) -> Result<(), StoreError>;

    /// Returns `false` if the token is unknown.
    async fn mark_graduated(&self, mint: &Pubkey) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct MemoryTokenRegistry {
    tokens: RwLock<HashMap<Pubkey, TokenRecord>>,
}

impl MemoryTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRegistry for MemoryTokenRegistry {
    async fn find_conflict(
        &self,
        name: &str,
        symbol: &str,
        now: i64,
        lock_window_secs: i64,
    ) -> Result<Option<NameConflict>, StoreError> {
        let tokens = self.tokens.read();
        Ok(tokens.values().find_map(|record| {
            record
                .conflicts_with(name, symbol, now, lock_window_secs)
                .map(|field| NameConflict { field, record: record.clone() })
        }))
    }

    async fn register(&self, record: TokenRecord) -> Result<(), StoreError> {
        self.tokens.write().insert(record.mint, record);
        Ok(())
    }

    async fn get(&self, mint: &Pubkey) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.tokens.read().get(mint).cloned())
    }

    async fn attach_metadata(&self, mint: &Pubkey, refs: &[String]) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write();
        let record = tokens
            .get_mut(mint)
            .ok_or_else(|| StoreError::Backend(format!("token {} not registered", mint)))?;
        record.aux_metadata.extend(refs.iter().cloned());
        Ok(())
    }

    async fn mark_graduated(&self, mint: &Pubkey) -> Result<bool, StoreError> {
        match self.tokens.write().get_mut(mint) {
            Some(record) => {
                record.graduated = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
