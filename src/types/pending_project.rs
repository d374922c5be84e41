//! Pending Project Records
//!
//! Durable session linking the config step and the pool step of a project
//! launch. It is keyed by the reserved mint address so any stateless handler
//! can resume the flow.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use super::launch_params::LaunchParams;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStage {
    /// Config transaction handed out, not yet seen on chain
    AwaitingConfig,
    /// Config transaction confirmed
    ConfigConfirmed,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PendingProjectRecord {
    pub mint: Pubkey,
    pub config_address: Pubkey,
    pub params: LaunchParams,
    pub stage: ProjectStage,
    pub created_at: i64,
}

impl PendingProjectRecord {
    pub fn new(mint: Pubkey, config_address: Pubkey, params: LaunchParams, created_at: i64) -> Self {
        Self {
            mint,
            config_address,
            params,
            stage: ProjectStage::AwaitingConfig,
            created_at,
        }
    }

    pub fn creator(&self) -> &Pubkey {
        &self.params.creator
    }

    pub fn is_expired(&self, now: i64, ttl_secs: i64) -> bool {
        now >= self.created_at.saturating_add(ttl_secs)
    }
}
