//! Strata Core - Core data structures for tiered configuration
//!
//! This crate defines the domain model shared by the whole system: bit-flag
//! access levels, the per-principal permission tree, the authorization gate,
//! the configuration document, and the settings resolver.

pub mod access;
pub mod document;
pub mod error;
pub mod gate;
pub mod logging;
pub mod resolve;

pub use access::*;
pub use document::*;
pub use error::*;
pub use gate::*;
pub use logging::*;
pub use resolve::*;

// Re-export commonly used external types
pub use tracing;
