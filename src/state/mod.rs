//! State Module
//!
//! Storage boundaries for the keypair pool, pending project sessions and the
//! token registry, with in-memory and Redis implementations.

pub mod keypair_store;
pub mod project_store;
pub mod redis_store;
pub mod token_registry;

// Re-export all state types for easy access
pub use keypair_store::*;
pub use project_store::*;
pub use redis_store::RedisStore;
pub use token_registry::*;
