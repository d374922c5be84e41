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

//! Scripted chain client for failure-path tests.
//!
//! Sends succeed unless a result was queued with [`MockChainClient::push_send_result`].
//! Every transaction handed to `send_and_confirm` is recorded.

#![allow(dead_code)]

use async_trait::async_trait;
use launchpad_mint_pool::{chain::ChainClient, ChainError};
use parking_lot::Mutex;
use solana_program::pubkey::Pubkey;
use solana_sdk::{hash::Hash, signature::Signature, transaction::Transaction};
use std::collections::{HashSet, VecDeque};

#[derive(Default)]
pub struct MockChainClient {
    send_results: Mutex<VecDeque<Result<(), ChainError>>>,
    existing_accounts: Mutex<HashSet<Pubkey>>,
    sent: Mutex<Vec<Transaction>>,
    blockhash_failure: Mutex<Option<ChainError>>,
    lookup_failure: Mutex<Option<ChainError>>,
    land_on_next_send: Mutex<Vec<Pubkey>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next send.
    pub fn push_send_result(&self, result: Result<(), ChainError>) {
        self.send_results.lock().push_back(result);
    }

    pub fn add_account(&self, address: Pubkey) {
        self.existing_accounts.lock().insert(address);
    }

    pub fn fail_blockhash(&self, error: ChainError) {
        *self.blockhash_failure.lock() = Some(error);
    }

    /// The next send times out after creating `address` on chain.
    pub fn push_landed_timeout(&self, address: Pubkey) {
        self.land_on_next_send.lock().push(address);
        self.push_send_result(Err(ChainError::Timeout));
    }

    /// Makes account lookups fail until called again with `None`.
    pub fn fail_lookups(&self, error: Option<ChainError>) {
        *self.lookup_failure.lock() = error;
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        match self.blockhash_failure.lock().clone() {
            Some(e) => Err(e),
            None => Ok(Hash::new_unique()),
        }
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        self.sent.lock().push(transaction.clone());
        let landed: Vec<Pubkey> = self.land_on_next_send.lock().drain(..).collect();
        self.existing_accounts.lock().extend(landed);
        let scripted = self.send_results.lock().pop_front().unwrap_or(Ok(()));
        scripted.map(|()| transaction.signatures[0])
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, ChainError> {
        if let Some(e) = self.lookup_failure.lock().clone() {
            return Err(e);
        }
        Ok(self.existing_accounts.lock().contains(address))
    }
}
