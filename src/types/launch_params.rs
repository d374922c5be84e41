//! Launch Parameters
//!
//! Token creation inputs, fee tiers and launch-protection modes.

use borsh::{BorshDeserialize, BorshSerialize};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::LaunchError;

/// Trading fee tiers offered at creation, in basis points.
#[derive(BorshSerialize, BorshDeserialize, FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FeeTier {
    Bps25 = 25,
    Bps100 = 100,
    Bps200 = 200,
    Bps400 = 400,
}

impl FeeTier {
    pub fn from_bps(bps: u16) -> Result<Self, LaunchError> {
        FeeTier::from_u16(bps).ok_or_else(|| LaunchError::InvalidConfig {
            reason: format!("unsupported fee tier {} bps (expected 25, 100, 200 or 400)", bps),
        })
    }

    pub fn bps(&self) -> u16 {
        *self as u16
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        FeeTier::Bps100
    }
}

/// Anti-sniping fee schedule applied right after creation.
///
/// The decaying fee itself is computed by clients from these fixed
/// parameters; the backend only carries the selected mode on chain.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchProtectionMode {
    #[default]
    Off,
    /// Fee starts at 50% and decays to the tier over 60 seconds
    Grace,
    /// Fee starts at 99% and decays to the tier over 5 minutes
    Extended,
}

impl LaunchProtectionMode {
    /// Starting fee in basis points and decay duration in seconds.
    pub fn schedule(&self) -> Option<(u16, u32)> {
        match self {
            LaunchProtectionMode::Off => None,
            LaunchProtectionMode::Grace => Some((5_000, 60)),
            LaunchProtectionMode::Extended => Some((9_900, 300)),
        }
    }

    /// Rejects fee-tier/mode pairs the launchpad program does not offer.
    pub fn validate_with(&self, tier: FeeTier) -> Result<(), LaunchError> {
        if *self == LaunchProtectionMode::Extended && tier == FeeTier::Bps25 {
            return Err(LaunchError::InvalidConfig {
                reason: "extended launch protection is not available on the 25 bps tier".into(),
            });
        }
        Ok(())
    }
}

impl FromStr for LaunchProtectionMode {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "off" | "none" => Ok(LaunchProtectionMode::Off),
            "grace" => Ok(LaunchProtectionMode::Grace),
            "extended" => Ok(LaunchProtectionMode::Extended),
            other => Err(LaunchError::InvalidConfig {
                reason: format!("unknown launch protection mode '{}'", other),
            }),
        }
    }
}

/// Everything needed to assemble a creation transaction.
///
/// `creator` always comes from the verified request identity, never from the
/// request body.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    pub creator: Pubkey,
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// Metadata/image reference (https or ipfs)
    pub image_uri: String,
    /// Optional first buy, in lamports
    pub initial_buy_lamports: Option<u64>,
    pub fee_tier: FeeTier,
    pub protection: LaunchProtectionMode,
}
