//! Constants for the launchpad mint pool
//!
//! This module contains the timing windows, program identifiers, fee tiers,
//! validation limits and storage key prefixes used throughout the crate.

use solana_program::{pubkey, pubkey::Pubkey};

/// Default reservation time-to-live (30 minutes in seconds)
pub const DEFAULT_RESERVATION_TTL_SECS: i64 = 30 * 60;

/// Default lifetime of a pending project record (60 minutes in seconds)
pub const DEFAULT_PENDING_PROJECT_TTL_SECS: i64 = 60 * 60;

/// Approximate validity of a freshly fetched blockhash (~150 slots)
pub const BLOCKHASH_VALIDITY_SECS: i64 = 60;

/// Default window during which a token name/symbol stays locked (24 hours)
pub const DEFAULT_NAME_LOCK_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Interval between background expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Number of candidates fetched per allocation round
pub const ALLOCATION_SCAN_BATCH: usize = 16;

/// Allocation rounds before giving up on a contended pool
pub const MAX_ALLOCATION_ROUNDS: usize = 4;

/// Upper bound on a single queue page
pub const MAX_QUEUE_PAGE_SIZE: usize = 100;

/// SPL Memo program (v2)
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Decimals of every mint created through the launchpad
pub const MINT_DECIMALS: u8 = 6;

/// Default compute unit limit attached to creation transactions
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 400_000;

/// Largest initial buy accepted at creation time (85 SOL)
pub const MAX_INITIAL_BUY_LAMPORTS: u64 = 85_000_000_000;

/// Token metadata limits
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_URI_LEN: usize = 200;
pub const MAX_ASSIGNMENT_NOTE_LEN: usize = 200;
pub const MAX_AUX_METADATA_REFS: usize = 8;

/// Default key prefix for every Redis key owned by this service
pub const DEFAULT_KEY_PREFIX: &str = "mintpool";

/// Default RPC endpoint, selected by network feature
#[cfg(feature = "mainnet")]
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
#[cfg(all(feature = "devnet", not(feature = "mainnet")))]
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
#[cfg(not(any(feature = "devnet", feature = "mainnet")))]
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
