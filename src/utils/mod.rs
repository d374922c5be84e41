//! Utility Functions
//!
//! Shared helpers used by the processors and the HTTP layer: request
//! validation, transaction wire encoding, time sources and rate limiting.

pub mod rate_limit;
pub mod serialization;
pub mod time;
pub mod validation;

// Re-export commonly used items for convenience
pub use rate_limit::*;
pub use serialization::*;
pub use time::*;
pub use validation::*;
