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

//! # Service Harness
//!
//! Builds a [`LaunchService`] over the in-memory stores, a manual clock and a
//! caller-chosen chain client, and provides the client-side signing step.

#![allow(dead_code)]

use launchpad_mint_pool::{
    chain::ChainClient,
    processors::{Collaborators, LaunchService, ServiceSettings},
    state::{seed_generated, KeypairStore, MemoryKeypairStore, MemoryProjectStore, MemoryTokenRegistry},
    types::{FeeTier, KeypairEntry, KeypairState, LaunchParams, LaunchProtectionMode, PlatformSettings},
    utils::{decode_transaction, encode_transaction, ManualTimeSource, RateLimit},
    LaunchError,
};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;

use super::{
    constants::{T0, TEST_NAME_LOCK, TEST_PROJECT_TTL, TEST_RESERVATION_TTL},
    setup::LAUNCHPAD_PROGRAM_ID,
};

/// Platform name used in every harness memo
pub const TEST_PLATFORM_NAME: &str = "Launchpad";

/// Limits high enough that no test trips them by accident
pub const UNLIMITED: RateLimit = RateLimit {
    max_requests: 0,
    window_secs: 60,
};

pub struct TestHarness {
    pub service: Arc<LaunchService>,
    pub store: Arc<MemoryKeypairStore>,
    pub projects: Arc<MemoryProjectStore>,
    pub registry: Arc<MemoryTokenRegistry>,
    pub clock: Arc<ManualTimeSource>,
    pub platform: Pubkey,
    /// Seeded pool addresses in queue order
    pub pool: Vec<Pubkey>,
}

impl TestHarness {
    pub fn builder(chain: Arc<dyn ChainClient>) -> HarnessBuilder {
        HarnessBuilder {
            chain,
            pool_size: 4,
            prepare_limit: UNLIMITED,
            submit_limit: UNLIMITED,
            compute_unit_price: 0,
        }
    }

    pub async fn entry(&self, address: &Pubkey) -> KeypairEntry {
        self.store
            .get(address)
            .await
            .expect("store read")
            .expect("entry exists")
    }

    pub async fn state_of(&self, address: &Pubkey) -> KeypairState {
        self.entry(address).await.state
    }
}

pub struct HarnessBuilder {
    chain: Arc<dyn ChainClient>,
    pool_size: usize,
    prepare_limit: RateLimit,
    submit_limit: RateLimit,
    compute_unit_price: u64,
}

impl HarnessBuilder {
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn prepare_limit(mut self, max_requests: u32, window_secs: i64) -> Self {
        self.prepare_limit = RateLimit {
            max_requests,
            window_secs,
        };
        self
    }

    pub fn submit_limit(mut self, max_requests: u32, window_secs: i64) -> Self {
        self.submit_limit = RateLimit {
            max_requests,
            window_secs,
        };
        self
    }

    pub fn compute_unit_price(mut self, micro_lamports: u64) -> Self {
        self.compute_unit_price = micro_lamports;
        self
    }

    pub async fn build(self) -> TestHarness {
        let store = Arc::new(MemoryKeypairStore::new());
        let clock = Arc::new(ManualTimeSource::new(T0));
        let projects = Arc::new(MemoryProjectStore::with_clock(clock.clone()));
        let registry = Arc::new(MemoryTokenRegistry::new());

        let pool = seed_generated(store.as_ref(), self.pool_size, 0)
            .await
            .expect("seed pool");

        let platform_signer = Keypair::new();
        let platform = platform_signer.pubkey();
        let settings = ServiceSettings {
            platform: platform_settings(self.compute_unit_price),
            reservation_ttl_secs: TEST_RESERVATION_TTL,
            pending_project_ttl_secs: TEST_PROJECT_TTL,
            name_lock_window_secs: TEST_NAME_LOCK,
            prepare_limit: self.prepare_limit,
            submit_limit: self.submit_limit,
        };

        let collaborators = Collaborators {
            keypairs: store.clone(),
            projects: projects.clone(),
            registry: registry.clone(),
            chain: self.chain,
            clock: clock.clone(),
        };
        let service = Arc::new(LaunchService::new(collaborators, platform_signer, settings));

        TestHarness {
            service,
            store,
            projects,
            registry,
            clock,
            platform,
            pool,
        }
    }
}

pub fn platform_settings(compute_unit_price: u64) -> PlatformSettings {
    PlatformSettings {
        launchpad_program_id: LAUNCHPAD_PROGRAM_ID,
        platform_config: Pubkey::new_from_array([9u8; 32]),
        platform_name: TEST_PLATFORM_NAME.to_string(),
        compute_unit_limit: 400_000,
        compute_unit_price_micro_lamports: compute_unit_price,
    }
}

/// Launch parameters with sensible defaults.
pub fn launch_params(creator: &Pubkey, name: &str, symbol: &str) -> LaunchParams {
    LaunchParams {
        creator: *creator,
        name: name.to_string(),
        symbol: symbol.to_string(),
        description: format!("{} test token", name),
        image_uri: format!("https://example.com/{}.json", symbol.to_lowercase()),
        initial_buy_lamports: None,
        fee_tier: FeeTier::Bps100,
        protection: LaunchProtectionMode::Off,
    }
}

/// What a wallet does with a prepared transaction: add its signature and re-encode.
pub fn client_sign(serialized_tx: &str, wallet: &Keypair) -> Result<String, LaunchError> {
    let mut transaction = decode_transaction(serialized_tx)?;
    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_partial_sign(&[wallet], blockhash)
        .map_err(|e| LaunchError::Signing { reason: e.to_string() })?;
    encode_transaction(&transaction)
}
