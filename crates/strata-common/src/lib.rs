//! # Strata Common
//!
//! Common types, utilities, and shared abstractions for Strata.
//!
//! This crate provides foundational types used across all Strata subsystems:
//! - Coordinate types (block, chunk, chunk-local)
//! - ID types (EntityId)
//! - Version information for schemas
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
