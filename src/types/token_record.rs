//! Token Records
//!
//! Bookkeeping row written once a creation is confirmed on chain.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub creator: Pubkey,
    pub created_at: i64,
    /// Graduated tokens hold their name and symbol permanently
    pub graduated: bool,
    /// Layout/page references attached after creation
    pub aux_metadata: Vec<String>,
}

impl TokenRecord {
    /// Whether this record blocks a new launch named `name` / `symbol` at `now`.
    ///
    /// Returns the clashing field name.
    pub fn conflicts_with(&self, name: &str, symbol: &str, now: i64, lock_window_secs: i64) -> Option<&'static str> {
        let locked = self.graduated || now < self.created_at.saturating_add(lock_window_secs);
        if !locked {
            return None;
        }
        if self.name.to_lowercase() == name.to_lowercase() {
            Some("name")
        } else if self.symbol.to_lowercase() == symbol.to_lowercase() {
            Some("symbol")
        } else {
            None
        }
    }
}
