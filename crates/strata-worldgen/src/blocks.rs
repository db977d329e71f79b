//! Standard block ids used by the bundled generators.
//!
//! The world core resolves ids through whatever registry the embedding game
//! injects; these constants and the matching registry exist so the bundled
//! generators, demos, and tests agree on one palette.

use strata_world::block::{Block, BlockRegistry};

/// Air (always id 0).
pub const AIR: u8 = 0;
/// Stone.
pub const STONE: u8 = 1;
/// Dirt.
pub const DIRT: u8 = 2;
/// Grass-topped dirt.
pub const GRASS: u8 = 3;
/// Sand.
pub const SAND: u8 = 4;
/// Snow cover.
pub const SNOW: u8 = 5;
/// Water (translucent).
pub const WATER: u8 = 6;
/// Tree trunk.
pub const WOOD: u8 = 7;
/// Tree canopy (translucent).
pub const LEAVES: u8 = 8;
/// Torch (light source).
pub const TORCH: u8 = 9;

/// Builds a registry covering the standard palette.
#[must_use]
pub fn standard_registry() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    registry.register(STONE, Block::opaque("stone"));
    registry.register(DIRT, Block::opaque("dirt"));
    registry.register(GRASS, Block::opaque("grass"));
    registry.register(SAND, Block::opaque("sand"));
    registry.register(SNOW, Block::opaque("snow"));
    registry.register(WATER, Block::translucent("water"));
    registry.register(WOOD, Block::opaque("wood"));
    registry.register(LEAVES, Block::translucent("leaves"));
    registry.register(TORCH, Block::luminous("torch", 14));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_properties() {
        let registry = standard_registry();
        assert!(!registry.is_translucent(STONE));
        assert!(registry.is_translucent(WATER));
        assert!(registry.is_translucent(LEAVES));
        assert_eq!(registry.luminance(TORCH), 14);
        assert!(registry.get(AIR).invisible);
    }
}
