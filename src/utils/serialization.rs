//! Serialization Utilities
//!
//! Wire encoding of transactions exchanged with clients: bincode for the
//! transaction layout the runtime expects, base64 for transport.

use base64::{engine::general_purpose::STANDARD, Engine};
use solana_sdk::{packet::PACKET_DATA_SIZE, transaction::Transaction};

use crate::error::LaunchError;

/// Serializes a (partially) signed transaction for the client.
///
/// Fails if the transaction would not fit in a single packet, which would
/// otherwise only surface as an opaque RPC error at submission.
pub fn encode_transaction(transaction: &Transaction) -> Result<String, LaunchError> {
    let bytes = bincode::serialize(transaction).map_err(|e| LaunchError::Signing {
        reason: format!("transaction serialization failed: {}", e),
    })?;
    if bytes.len() > PACKET_DATA_SIZE {
        return Err(LaunchError::InvalidConfig {
            reason: format!("transaction is {} bytes, limit is {}", bytes.len(), PACKET_DATA_SIZE),
        });
    }
    Ok(STANDARD.encode(bytes))
}

/// Decodes a client-returned transaction.
pub fn decode_transaction(encoded: &str) -> Result<Transaction, LaunchError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| LaunchError::validation("signed_tx", format!("invalid base64: {}", e)))?;
    if bytes.len() > PACKET_DATA_SIZE {
        return Err(LaunchError::validation("signed_tx", "transaction exceeds packet size"));
    }
    bincode::deserialize(&bytes).map_err(|e| LaunchError::validation("signed_tx", format!("not a transaction: {}", e)))
}
