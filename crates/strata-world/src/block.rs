//! Block properties and the block registry.
//!
//! The world core never owns block metadata; shapes, families, and rotation
//! data live in an external subsystem. The core only needs the handful of
//! properties that gate generation and light propagation, resolved by numeric
//! id through a registry passed in by the caller.

use serde::{Deserialize, Serialize};

/// Properties of a block type that the world core reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Display name, for logs and debugging
    pub name: String,
    /// Whether light passes through this block
    pub translucent: bool,
    /// Whether the block occupies no visible volume (air-like)
    pub invisible: bool,
    /// Light emitted by this block (0-15)
    pub luminance: u8,
}

impl Block {
    /// The air block: invisible, translucent, emits nothing.
    #[must_use]
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            translucent: true,
            invisible: true,
            luminance: 0,
        }
    }

    /// A plain opaque block with the given name.
    #[must_use]
    pub fn opaque(name: &str) -> Self {
        Self {
            name: name.to_string(),
            translucent: false,
            invisible: false,
            luminance: 0,
        }
    }

    /// A translucent, visible block (water, leaves, glass).
    #[must_use]
    pub fn translucent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            translucent: true,
            invisible: false,
            luminance: 0,
        }
    }

    /// A light-emitting block with the given luminance (clamped to 0-15).
    #[must_use]
    pub fn luminous(name: &str, luminance: u8) -> Self {
        Self {
            name: name.to_string(),
            translucent: true,
            invisible: false,
            luminance: luminance.min(15),
        }
    }
}

/// Lookup table from numeric block id to block properties.
///
/// Id 0 is always air. Unregistered ids resolve to air, so a registry is
/// total over the full `u8` range.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
}

impl BlockRegistry {
    /// Creates a registry with every id mapped to air.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::air(); 256],
        }
    }

    /// Registers a block under the given id, replacing any previous entry.
    pub fn register(&mut self, id: u8, block: Block) {
        self.blocks[id as usize] = block;
    }

    /// Resolves a block id to its properties.
    #[must_use]
    pub fn get(&self, id: u8) -> &Block {
        &self.blocks[id as usize]
    }

    /// Whether light passes through the block with the given id.
    #[must_use]
    pub fn is_translucent(&self, id: u8) -> bool {
        self.blocks[id as usize].translucent
    }

    /// Light emitted by the block with the given id.
    #[must_use]
    pub fn luminance(&self, id: u8) -> u8 {
        self.blocks[id as usize].luminance
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
