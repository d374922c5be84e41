//! Requester identity
//!
//! Token verification happens upstream; the service only needs "which wallet
//! is this". [`IdentityVerifier`] is that seam.

use async_trait::async_trait;
use axum::http::HeaderMap;
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::LaunchError;

/// Header set by the authenticating gateway.
pub const WALLET_HEADER: &str = "x-wallet-address";

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// The verified wallet behind a request, `Unauthorized` if there is none.
    async fn verify(&self, headers: &HeaderMap) -> Result<Pubkey, LaunchError>;
}

/// Trusts the wallet header written by an authenticating gateway in front of
/// the service. Never expose the service directly when using it.
#[derive(Debug, Clone)]
pub struct GatewayHeaderVerifier {
    header: String,
}

impl GatewayHeaderVerifier {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_ascii_lowercase(),
        }
    }
}

impl Default for GatewayHeaderVerifier {
    fn default() -> Self {
        Self::new(WALLET_HEADER)
    }
}

#[async_trait]
impl IdentityVerifier for GatewayHeaderVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<Pubkey, LaunchError> {
        let value = headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .ok_or(LaunchError::Unauthorized)?;
        Pubkey::from_str(value.trim()).map_err(|_| LaunchError::Unauthorized)
    }
}
