//! Chain Client
//!
//! The network collaborator used by the assembler and the finalizer. The RPC
//! implementation talks to a Solana node; tests plug in a `BanksClient`
//! adapter or a scripted double.

use async_trait::async_trait;
use log::{debug, warn};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use std::time::Duration;

use crate::error::ChainError;

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, ChainError>;

    /// Sends and waits for `confirmed` commitment.
    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, ChainError>;
}

/// JSON-RPC backed client.
pub struct RpcChainClient {
    rpc_client: RpcClient,
    confirm_timeout: Duration,
}

impl RpcChainClient {
    pub fn new(rpc_endpoint: &str, confirm_timeout: Duration) -> Self {
        let rpc_client = RpcClient::new_with_commitment(rpc_endpoint.to_string(), CommitmentConfig::confirmed());
        Self {
            rpc_client,
            confirm_timeout,
        }
    }
}

fn map_client_error(e: ClientError) -> ChainError {
    match e.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => ChainError::Transport(e.to_string()),
        _ => ChainError::Rejected(e.to_string()),
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.rpc_client.get_latest_blockhash().await.map_err(map_client_error)
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        debug!("Sending transaction {:?}", transaction.signatures.first());
        match tokio::time::timeout(
            self.confirm_timeout,
            self.rpc_client.send_and_confirm_transaction(transaction),
        )
        .await
        {
            Ok(result) => result.map_err(map_client_error),
            Err(_) => {
                warn!("No confirmation after {:?}", self.confirm_timeout);
                Err(ChainError::Timeout)
            }
        }
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, ChainError> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(map_client_error)?;
        Ok(response.value.is_some())
    }
}
