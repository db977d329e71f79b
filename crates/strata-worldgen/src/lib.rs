//! # Strata Worldgen
//!
//! Procedural world generation for Strata: noise-driven biome selection,
//! first-pass terrain, and second-pass flora. Generators plug into
//! `strata-world`'s generator manager and are pure functions of the world
//! seed, the biome source, and the chunk position.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod biome;
pub mod blocks;
pub mod flora;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::biome::*;
    pub use crate::blocks::*;
    pub use crate::flora::*;
    pub use crate::terrain::*;
}

pub use prelude::*;
