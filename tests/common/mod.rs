/*
MIT License

Copyright (c) 2024 Davinci

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! # Common Test Utilities
//!
//! Shared helpers for the integration tests:
//!
//! - Program-test environment with a stub launchpad program
//! - `BanksClient` and scripted chain clients
//! - Service harness over the in-memory stores
//! - Client-side signing helpers

pub mod harness;
pub mod mock_chain;
pub mod setup;

// Re-export commonly used types and functions
#[allow(unused_imports)]
pub use harness::*;
#[allow(unused_imports)]
pub use mock_chain::*;
#[allow(unused_imports)]
pub use setup::*;

// Re-export external dependencies commonly used in tests
// Allow unused imports since these are provided for optional use across test modules
#[allow(unused_imports)]
pub use solana_program::pubkey::Pubkey;
#[allow(unused_imports)]
pub use solana_sdk::{
    signature::{Keypair, Signer},
    transaction::Transaction,
};

/// Test result type alias for convenience
#[allow(dead_code)]
pub type TestResult = Result<(), launchpad_mint_pool::LaunchError>;

/// Common test constants
pub mod constants {
    /// Start of every manual clock (2023-11-14T22:13:20Z)
    pub const T0: i64 = 1_700_000_000;

    /// Reservation TTL used by the harness
    #[allow(dead_code)]
    pub const TEST_RESERVATION_TTL: i64 = 30 * 60;

    /// Pending project TTL used by the harness
    #[allow(dead_code)]
    pub const TEST_PROJECT_TTL: i64 = 60 * 60;

    /// Name lock window used by the harness
    #[allow(dead_code)]
    pub const TEST_NAME_LOCK: i64 = 24 * 60 * 60;

    /// Creator balance in program-test environments
    #[allow(dead_code)]
    pub const CREATOR_LAMPORTS: u64 = 100_000_000_000; // 100 SOL
}
