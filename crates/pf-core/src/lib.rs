//! pinfluence/crates/pf-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Pinfluence.

pub mod error;
pub mod interactors;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
