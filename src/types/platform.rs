//! Platform identity shared by the assembler and the finalizer.

use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSettings {
    /// On-chain launchpad program
    pub launchpad_program_id: Pubkey,
    /// Default pool configuration used by single-step launches
    pub platform_config: Pubkey,
    /// Leading text of every platform memo
    pub platform_name: String,
    pub compute_unit_limit: u32,
    /// Priority fee; zero omits the instruction
    pub compute_unit_price_micro_lamports: u64,
}

impl PlatformSettings {
    pub fn memo_text(&self, tag: &str) -> String {
        format!("{} | {}", self.platform_name, tag)
    }

    /// Whether a memo payload was written by this platform.
    pub fn is_platform_memo(&self, data: &[u8]) -> bool {
        let prefix = format!("{} | ", self.platform_name);
        data.starts_with(prefix.as_bytes())
    }
}
