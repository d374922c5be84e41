//! # Launchpad Mint Pool
//!
//! Mint-keypair reservation and token-creation transaction pipeline for a
//! curated Solana launchpad.
//!
//! Pre-generated mint keypairs live in a shared pool. A creation request
//! reserves one, the service builds and partially signs the creation
//! transaction, the client adds the creator signature and hands it back, and
//! the service validates, submits and retires the keypair. Reservations
//! expire, can be released at any time, and are never handed to two
//! requesters at once.
//!
//! ## Layout
//! - [`types`]: pool entries, launch parameters, launchpad instruction data
//! - [`state`]: keypair pool, pending project and token registry stores
//! - [`processors`]: reservation, assembly, submission, admin assignment and
//!   the request-level [`processors::LaunchService`]
//! - [`chain`]: the RPC collaborator
//! - [`server`]: axum routes
//! - [`config`]: environment configuration for the binary

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod processors;
pub mod server;
pub mod state;
pub mod types;
pub mod utils;

pub use error::{ChainError, ErrorClass, LaunchError, StoreError};
pub use processors::{Collaborators, LaunchService, ServiceSettings};
