//! Launchpad Instructions
//!
//! Instruction data understood by the on-chain launchpad program. The backend
//! only builds these; it never executes them.

use borsh::{BorshDeserialize, BorshSerialize};

use super::launch_params::LaunchProtectionMode;

/// Instructions of the launchpad program, borsh-encoded with a one byte tag.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum LaunchInstruction {
    /// Creates a per-project pool configuration.
    ///
    /// # Account Order:
    /// 0. **Config** (signer, writable) - fresh config account
    /// 1. **Creator** (signer, writable) - pays for the config
    /// 2. **Platform Authority** (signer) - platform co-signature
    /// 3. **System Program** (readable)
    CreateConfig {
        fee_tier_bps: u16,
        protection: LaunchProtectionMode,
    },

    /// Creates the bonding-curve pool for an already initialized mint.
    ///
    /// # Account Order:
    /// 0. **Mint** (signer, writable) - reserved pool keypair
    /// 1. **Creator** (signer, writable)
    /// 2. **Platform Authority** (signer) - current mint authority
    /// 3. **Config** (readable) - platform default or project config
    /// 4. **System Program** (readable)
    /// 5. **SPL Token Program** (readable)
    CreatePool {
        name: String,
        symbol: String,
        uri: String,
        fee_tier_bps: u16,
        protection: LaunchProtectionMode,
    },

    /// Creator's initial buy on the fresh pool.
    ///
    /// # Account Order:
    /// 0. **Mint** (writable)
    /// 1. **Buyer** (signer, writable)
    /// 2. **Buyer Token Account** (writable)
    Buy {
        lamports_in: u64,
        min_tokens_out: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool_tag_is_stable() {
        let data = LaunchInstruction::CreatePool {
            name: "Foo".into(),
            symbol: "FOO".into(),
            uri: "https://example.com/foo.json".into(),
            fee_tier_bps: 100,
            protection: LaunchProtectionMode::Grace,
        }
        .try_to_vec()
        .unwrap();
        assert_eq!(data[0], 1);
        let decoded = LaunchInstruction::try_from_slice(&data).unwrap();
        assert!(matches!(decoded, LaunchInstruction::CreatePool { fee_tier_bps: 100, .. }));
    }
}
