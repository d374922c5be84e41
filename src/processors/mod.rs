//! Processors Module
//!
//! The launch pipeline organized by stage: reservation, assembly,
//! submission, admin assignment and the request-level service on top.

pub mod admin;
pub mod assembler;
pub mod finalizer;
pub mod launch;
pub mod reservation;

// Re-export reservation management
pub use reservation::*;

// Re-export transaction assembly
pub use assembler::*;

// Re-export submission handling
pub use finalizer::*;

// Re-export admin assignment
pub use admin::*;

// Re-export the launch service
pub use launch::*;
