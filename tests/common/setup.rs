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

//! # Test Environment Setup Utilities
//!
//! Program-test environment running a stub of the launchpad program, and a
//! [`ChainClient`] backed by its `BanksClient`.

use async_trait::async_trait;
use borsh::BorshDeserialize;
use launchpad_mint_pool::{chain::ChainClient, types::LaunchInstruction, ChainError};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{rent::Rent, Sysvar},
};
use solana_program_test::{processor, BanksClient, BanksClientError, ProgramTest};
use solana_sdk::{
    account::Account, hash::Hash, signature::Signature, signer::Signer, transaction::Transaction,
};
use std::env;
use tokio::sync::Mutex;

use super::constants::CREATOR_LAMPORTS;

/// Address the stub launchpad is deployed at
pub const LAUNCHPAD_PROGRAM_ID: Pubkey = Pubkey::new_from_array([7u8; 32]);

/// Size of the config accounts created by the stub
const STUB_CONFIG_LEN: usize = 8;

/// Minimal launchpad program: checks signers and creates config accounts.
pub fn process_launchpad(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    let instruction = LaunchInstruction::try_from_slice(data).map_err(|_| ProgramError::InvalidInstructionData)?;
    let iter = &mut accounts.iter();

    match instruction {
        LaunchInstruction::CreateConfig { fee_tier_bps, .. } => {
            let config = next_account_info(iter)?;
            let creator = next_account_info(iter)?;
            let platform = next_account_info(iter)?;
            let system = next_account_info(iter)?;
            if !config.is_signer || !creator.is_signer || !platform.is_signer {
                return Err(ProgramError::MissingRequiredSignature);
            }
            msg!("CreateConfig {} bps", fee_tier_bps);
            let lamports = Rent::get()?.minimum_balance(STUB_CONFIG_LEN);
            invoke(
                &system_instruction::create_account(
                    creator.key,
                    config.key,
                    lamports,
                    STUB_CONFIG_LEN as u64,
                    program_id,
                ),
                &[creator.clone(), config.clone(), system.clone()],
            )
        }
        LaunchInstruction::CreatePool { name, symbol, .. } => {
            let mint = next_account_info(iter)?;
            let creator = next_account_info(iter)?;
            let platform = next_account_info(iter)?;
            if !mint.is_signer || !creator.is_signer || !platform.is_signer {
                return Err(ProgramError::MissingRequiredSignature);
            }
            if *mint.owner != spl_token::id() {
                return Err(ProgramError::UninitializedAccount);
            }
            msg!("CreatePool {} ({})", name, symbol);
            Ok(())
        }
        LaunchInstruction::Buy { lamports_in, .. } => {
            let _mint = next_account_info(iter)?;
            let buyer = next_account_info(iter)?;
            if !buyer.is_signer {
                return Err(ProgramError::MissingRequiredSignature);
            }
            msg!("Buy {} lamports", lamports_in);
            Ok(())
        }
    }
}

/// Create a program test with the stub launchpad
pub fn create_program_test() -> ProgramTest {
    ProgramTest::new(
        "launchpad_stub",
        LAUNCHPAD_PROGRAM_ID,
        processor!(process_launchpad),
    )
}

/// Test environment context
pub struct TestEnvironment {
    pub chain: BanksChainClient,
    pub creator: solana_sdk::signature::Keypair,
}

/// Start a program-test environment with one funded creator wallet
pub async fn start_test_environment() -> TestEnvironment {
    env::set_var("RUST_LOG", "error,solana_runtime::message_processor::stable_log=error");
    let _ = env_logger::try_init();

    let creator = solana_sdk::signature::Keypair::new();
    let mut program_test = create_program_test();
    program_test.add_account(
        creator.pubkey(),
        Account::new(CREATOR_LAMPORTS, 0, &system_program::id()),
    );
    let (banks_client, _payer, _recent_blockhash) = program_test.start().await;

    TestEnvironment {
        chain: BanksChainClient::new(banks_client),
        creator,
    }
}

/// [`ChainClient`] over a program-test bank.
pub struct BanksChainClient {
    banks_client: Mutex<BanksClient>,
}

impl BanksChainClient {
    pub fn new(banks_client: BanksClient) -> Self {
        Self {
            banks_client: Mutex::new(banks_client),
        }
    }

    #[allow(dead_code)]
    pub async fn get_account(&self, address: &Pubkey) -> Option<Account> {
        self.banks_client.lock().await.get_account(*address).await.ok().flatten()
    }
}

fn map_banks_error(e: BanksClientError) -> ChainError {
    match e {
        BanksClientError::TransactionError(err) | BanksClientError::SimulationError { err, .. } => {
            ChainError::Rejected(err.to_string())
        }
        other => ChainError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ChainClient for BanksChainClient {
    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.banks_client
            .lock()
            .await
            .get_latest_blockhash()
            .await
            .map_err(map_banks_error)
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        self.banks_client
            .lock()
            .await
            .process_transaction(transaction.clone())
            .await
            .map_err(map_banks_error)?;
        Ok(transaction.signatures[0])
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, ChainError> {
        let account = self
            .banks_client
            .lock()
            .await
            .get_account(*address)
            .await
            .map_err(map_banks_error)?;
        Ok(account.is_some())
    }
}
