//! World-space access façade.
//!
//! Gameplay code addresses the world in block coordinates; this façade does
//! the chunk lookup and coordinate math, delegates storage to the chunk
//! provider, and keeps lighting consistent when blocks change.

use std::sync::Arc;

use strata_common::BlockPos;

use crate::block::BlockRegistry;
use crate::chunk::{ChunkRef, CHUNK_DIMS};
use crate::propagation::LightPropagator;
use crate::provider::ChunkProvider;
use crate::world_view::WorldView;

/// World-space get/set of block, light, and state, over any chunk provider.
pub struct WorldProvider {
    provider: Arc<dyn ChunkProvider>,
    registry: Arc<BlockRegistry>,
}

impl WorldProvider {
    /// Creates a façade over the given provider and block registry.
    #[must_use]
    pub fn new(provider: Arc<dyn ChunkProvider>, registry: Arc<BlockRegistry>) -> Self {
        Self { provider, registry }
    }

    /// The underlying chunk provider.
    #[must_use]
    pub fn chunk_provider(&self) -> &Arc<dyn ChunkProvider> {
        &self.provider
    }

    /// The block registry this world resolves ids against.
    #[must_use]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    fn chunk_for(&self, pos: BlockPos) -> Option<(ChunkRef, u32, u32, u32)> {
        if pos.y < 0 || pos.y >= CHUNK_DIMS.y as i32 {
            return None;
        }
        let chunk = self.provider.chunk(pos.to_chunk_pos(CHUNK_DIMS))?;
        let local = pos.to_local_pos(CHUNK_DIMS);
        Some((chunk, local.x.into(), local.y.into(), local.z.into()))
    }

    /// Block id at a world position, or None when the chunk is not
    /// available (or the position is outside the world's vertical extent).
    #[must_use]
    pub fn block_at(&self, pos: BlockPos) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let id = chunk.read().block(x, y, z);
        Some(id)
    }

    /// Sets a block and relights its neighborhood, returning the previous
    /// id, or None when the chunk is not available.
    ///
    /// When the neighboring chunks are not all resident the relight is
    /// deferred: the chunk is marked light-dirty and picked up by a later
    /// propagation pass.
    pub fn set_block(&self, pos: BlockPos, id: u8) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let previous = chunk.write().set_block(x, y, z, id);
        if previous == id {
            return Some(previous);
        }

        let chunk_pos = pos.to_chunk_pos(CHUNK_DIMS);
        if let Some(view) = WorldView::local(chunk_pos, |p| self.provider.chunk(p)) {
            LightPropagator::new(&view, &self.registry).update_block_change(
                x as i32, y as i32, z as i32, id, previous,
            );
        } else {
            chunk.write().set_light_dirty(true);
        }
        Some(previous)
    }

    /// Sunlight level at a world position.
    #[must_use]
    pub fn sunlight_at(&self, pos: BlockPos) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let level = chunk.read().sunlight(x, y, z);
        Some(level)
    }

    /// Artificial light level at a world position.
    #[must_use]
    pub fn light_at(&self, pos: BlockPos) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let level = chunk.read().light(x, y, z);
        Some(level)
    }

    /// Sets the sunlight level directly, returning the previous one.
    pub fn set_sunlight(&self, pos: BlockPos, level: u8) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let prev = chunk.write().set_sunlight(x, y, z, level);
        Some(prev)
    }

    /// Sets the artificial light level directly, returning the previous one.
    pub fn set_light(&self, pos: BlockPos, level: u8) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let prev = chunk.write().set_light(x, y, z, level);
        Some(prev)
    }

    /// Block sub-state at a world position.
    #[must_use]
    pub fn state_at(&self, pos: BlockPos) -> Option<u8> {
        let (chunk, x, y, z) = self.chunk_for(pos)?;
        let state = chunk.read().state(x, y, z);
        Some(state)
    }

    /// Compare-and-swap on a block's sub-state. Returns false when the
    /// expectation is stale or the chunk is not available.
    pub fn try_set_state(&self, pos: BlockPos, state: u8, expected: u8) -> bool {
        match self.chunk_for(pos) {
            Some((chunk, x, y, z)) => chunk.write().try_set_state(x, y, z, state, expected),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::chunk::{Chunk, MAX_LIGHT};
    use crate::provider::RemoteChunkProvider;
    use strata_common::ChunkPos;

    const STONE: u8 = 1;
    const TORCH: u8 = 2;

    fn test_world() -> WorldProvider {
        let mut registry = BlockRegistry::new();
        registry.register(STONE, Block::opaque("stone"));
        registry.register(TORCH, Block::luminous("torch", 10));

        let provider = RemoteChunkProvider::new();
        for x in -1..=1 {
            for z in -1..=1 {
                provider.receive_chunk(Chunk::new(ChunkPos::new(x, 0, z)));
            }
        }
        WorldProvider::new(Arc::new(provider), Arc::new(registry))
    }

    #[test]
    fn test_block_round_trip_in_world_coordinates() {
        let world = test_world();
        let pos = BlockPos::new(-3, 70, 18);
        assert_eq!(world.block_at(pos), Some(0));
        assert_eq!(world.set_block(pos, STONE), Some(0));
        assert_eq!(world.block_at(pos), Some(STONE));
    }

    #[test]
    fn test_missing_chunk_yields_none() {
        let world = test_world();
        let far = BlockPos::new(1000, 10, 0);
        assert_eq!(world.block_at(far), None);
        assert_eq!(world.set_block(far, STONE), None);
        assert!(!world.try_set_state(far, 1, 0));
    }

    #[test]
    fn test_vertical_out_of_world_yields_none() {
        let world = test_world();
        assert_eq!(world.block_at(BlockPos::new(0, -1, 0)), None);
        assert_eq!(world.block_at(BlockPos::new(0, 256, 0)), None);
    }

    #[test]
    fn test_set_block_relights_neighborhood() {
        let world = test_world();
        let pos = BlockPos::new(4, 50, 4);
        world.set_block(pos, TORCH);
        assert_eq!(world.light_at(pos), Some(10));
        assert_eq!(world.light_at(BlockPos::new(4, 50, 7)), Some(7));
    }

    #[test]
    fn test_state_compare_and_swap() {
        let world = test_world();
        let pos = BlockPos::new(0, 10, 0);
        assert!(world.try_set_state(pos, 3, 0));
        assert!(!world.try_set_state(pos, 5, 0));
        assert_eq!(world.state_at(pos), Some(3));
    }

    #[test]
    fn test_direct_light_writes() {
        let world = test_world();
        let pos = BlockPos::new(2, 30, 2);
        assert_eq!(world.set_sunlight(pos, MAX_LIGHT), Some(0));
        assert_eq!(world.sunlight_at(pos), Some(MAX_LIGHT));
    }
}
