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

//! # Transaction Assembler
//!
//! Builds the creation transactions handed to clients for co-signing.
//!
//! ## Transactions
//! - **Creation**: compute budget, platform memo, mint account, mint
//!   initialization, creator token account, `CreatePool`, optional `Buy`
//! - **Project config**: compute budget, platform memo, `CreateConfig`
//! - **Project pool**: the creation layout against a project config
//!
//! Every transaction is paid by the creator and leaves exactly the creator's
//! signature slot empty. The mint (or config) keypair and the platform
//! authority sign here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use launchpad_mint_pool::processors::TransactionAssembler;
//! use launchpad_mint_pool::types::PlatformSettings;
//! use solana_sdk::{pubkey::Pubkey, signature::Keypair};
//! use std::sync::Arc;
//!
//! let settings = PlatformSettings {
//!     launchpad_program_id: Pubkey::new_unique(),
//!     platform_config: Pubkey::new_unique(),
//!     platform_name: "Launchpad".into(),
//!     compute_unit_limit: 400_000,
//!     compute_unit_price_micro_lamports: 0,
//! };
//! let assembler = TransactionAssembler::new(settings, Arc::new(Keypair::new()));
//! ```

use borsh::BorshSerialize;
use log::debug;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
};
use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    hash::Hash,
    message::Message,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::{get_associated_token_address, instruction::create_associated_token_account_idempotent};
use spl_token::state::Mint;
use std::sync::Arc;

use crate::{
    constants::{MEMO_PROGRAM_ID, MINT_DECIMALS},
    error::LaunchError,
    processors::reservation::ReservedKeypair,
    types::{LaunchInstruction, LaunchParams, PendingProjectRecord, PlatformSettings},
    utils::encode_transaction,
};

/// A partially signed transaction and its wire form.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub transaction: Transaction,
    /// base64(bincode(transaction))
    pub serialized_tx: String,
}

/// Programs a client-returned creation transaction may invoke.
pub fn allowed_programs(settings: &PlatformSettings) -> [Pubkey; 6] {
    [
        compute_budget::id(),
        MEMO_PROGRAM_ID,
        system_program::id(),
        spl_token::id(),
        spl_associated_token_account::id(),
        settings.launchpad_program_id,
    ]
}

/// Creates the `CreatePool` instruction.
///
/// # Account Order:
/// 0. **Mint** (signer, writable)
/// 1. **Creator** (signer, writable)
/// 2. **Platform Authority** (signer)
/// 3. **Config** (readable)
/// 4. **System Program** (readable)
/// 5. **SPL Token Program** (readable)
pub fn create_pool_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    creator: &Pubkey,
    platform: &Pubkey,
    config: &Pubkey,
    params: &LaunchParams,
) -> Result<Instruction, LaunchError> {
    let data = LaunchInstruction::CreatePool {
        name: params.name.clone(),
        symbol: params.symbol.clone(),
        uri: params.image_uri.clone(),
        fee_tier_bps: params.fee_tier.bps(),
        protection: params.protection,
    };
    launchpad_instruction(
        program_id,
        &data,
        vec![
            AccountMeta::new(*mint, true),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(*platform, true),
            AccountMeta::new_readonly(*config, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
    )
}

/// Creates the `CreateConfig` instruction.
pub fn create_config_instruction(
    program_id: &Pubkey,
    config: &Pubkey,
    creator: &Pubkey,
    platform: &Pubkey,
    params: &LaunchParams,
) -> Result<Instruction, LaunchError> {
    launchpad_instruction(
        program_id,
        &LaunchInstruction::CreateConfig {
            fee_tier_bps: params.fee_tier.bps(),
            protection: params.protection,
        },
        vec![
            AccountMeta::new(*config, true),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(*platform, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Creates the creator's initial `Buy` instruction.
pub fn buy_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    buyer: &Pubkey,
    lamports_in: u64,
) -> Result<Instruction, LaunchError> {
    launchpad_instruction(
        program_id,
        &LaunchInstruction::Buy {
            lamports_in,
            min_tokens_out: 0,
        },
        vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new(get_associated_token_address(buyer, mint), false),
        ],
    )
}

fn launchpad_instruction(
    program_id: &Pubkey,
    data: &LaunchInstruction,
    accounts: Vec<AccountMeta>,
) -> Result<Instruction, LaunchError> {
    let data = data.try_to_vec().map_err(|e| LaunchError::Signing {
        reason: format!("instruction encoding: {}", e),
    })?;
    Ok(Instruction::new_with_bytes(*program_id, &data, accounts))
}

pub struct TransactionAssembler {
    settings: PlatformSettings,
    platform: Arc<Keypair>,
}

impl TransactionAssembler {
    pub fn new(settings: PlatformSettings, platform: Arc<Keypair>) -> Self {
        Self { settings, platform }
    }

    pub fn settings(&self) -> &PlatformSettings {
        &self.settings
    }

    pub fn platform_pubkey(&self) -> Pubkey {
        self.platform.pubkey()
    }

    fn preamble(&self, memo_tag: &str) -> Vec<Instruction> {
        let mut instructions = vec![ComputeBudgetInstruction::set_compute_unit_limit(
            self.settings.compute_unit_limit,
        )];
        if self.settings.compute_unit_price_micro_lamports > 0 {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_price(
                self.settings.compute_unit_price_micro_lamports,
            ));
        }
        instructions.push(Instruction {
            program_id: MEMO_PROGRAM_ID,
            accounts: vec![],
            data: self.settings.memo_text(memo_tag).into_bytes(),
        });
        instructions
    }

    fn creation_instructions(
        &self,
        params: &LaunchParams,
        mint: &Pubkey,
        config: &Pubkey,
    ) -> Result<Vec<Instruction>, LaunchError> {
        params.protection.validate_with(params.fee_tier)?;

        let creator = &params.creator;
        let platform = self.platform.pubkey();
        let program_id = &self.settings.launchpad_program_id;

        let mut instructions = self.preamble(&params.symbol);
        instructions.push(system_instruction::create_account(
            creator,
            mint,
            Rent::default().minimum_balance(Mint::LEN),
            Mint::LEN as u64,
            &spl_token::id(),
        ));
        instructions.push(
            spl_token::instruction::initialize_mint2(&spl_token::id(), mint, &platform, None, MINT_DECIMALS)
                .map_err(|e| LaunchError::Signing {
                    reason: format!("initialize_mint2: {}", e),
                })?,
        );
        instructions.push(create_associated_token_account_idempotent(
            creator,
            creator,
            mint,
            &spl_token::id(),
        ));
        instructions.push(create_pool_instruction(program_id, mint, creator, &platform, config, params)?);
        if let Some(lamports) = params.initial_buy_lamports {
            instructions.push(buy_instruction(program_id, mint, creator, lamports)?);
        }
        Ok(instructions)
    }

    fn finish(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        blockhash: Hash,
        signers: &[&Keypair],
    ) -> Result<PreparedTransaction, LaunchError> {
        let message = Message::new_with_blockhash(instructions, Some(payer), &blockhash);
        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_partial_sign(signers, blockhash)
            .map_err(|e| LaunchError::Signing { reason: e.to_string() })?;
        let serialized_tx = encode_transaction(&transaction)?;
        debug!(
            "Assembled {} instructions, {} of {} signatures attached",
            instructions.len(),
            signers.len(),
            transaction.signatures.len()
        );
        Ok(PreparedTransaction {
            transaction,
            serialized_tx,
        })
    }

    /// Single-step launch against the platform default config.
    pub fn build_creation_transaction(
        &self,
        params: &LaunchParams,
        reserved: &ReservedKeypair,
        blockhash: Hash,
    ) -> Result<PreparedTransaction, LaunchError> {
        let mint = reserved.address();
        let instructions = self.creation_instructions(params, &mint, &self.settings.platform_config)?;
        self.finish(&instructions, &params.creator, blockhash, &[reserved.signer(), &*self.platform])
    }

    /// First phase of a project launch: the project's own pool config.
    ///
    /// `config` is generated per project and discarded once this transaction
    /// is signed.
    pub fn build_config_transaction(
        &self,
        params: &LaunchParams,
        config: &Keypair,
        blockhash: Hash,
    ) -> Result<PreparedTransaction, LaunchError> {
        params.protection.validate_with(params.fee_tier)?;
        let mut instructions = self.preamble("config");
        instructions.push(create_config_instruction(
            &self.settings.launchpad_program_id,
            &config.pubkey(),
            &params.creator,
            &self.platform.pubkey(),
            params,
        )?);
        self.finish(&instructions, &params.creator, blockhash, &[config, &*self.platform])
    }

    /// Second phase of a project launch, reusing the mint reserved in the first.
    pub fn build_pool_transaction(
        &self,
        record: &PendingProjectRecord,
        reserved: &ReservedKeypair,
        blockhash: Hash,
    ) -> Result<PreparedTransaction, LaunchError> {
        if record.mint != reserved.address() {
            return Err(LaunchError::ProjectSessionExpired { mint: record.mint });
        }
        let instructions = self.creation_instructions(&record.params, &record.mint, &record.config_address)?;
        self.finish(&instructions, record.creator(), blockhash, &[reserved.signer(), &*self.platform])
    }
}
