//! Types Module
//!
//! Pool entries, launch parameters, launchpad instruction data and the
//! records persisted alongside the pool.

pub mod instructions;
pub mod keypair_entry;
pub mod launch_params;
pub mod pending_project;
pub mod platform;
pub mod token_record;

// Re-export all types for easy access
pub use instructions::*;
pub use keypair_entry::*;
pub use launch_params::*;
pub use pending_project::*;
pub use platform::*;
pub use token_record::*;
