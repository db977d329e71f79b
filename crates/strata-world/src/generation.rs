//! Chunk generation orchestration.
//!
//! First-pass generators populate a fresh chunk's block array from nothing
//! but the world seed, the biome source, and the chunk position — they are
//! pure, so generation can run on worker threads. Second-pass generators
//! refine a chunk through a world view and may read or write its neighbors
//! (tree canopies overhang chunk boundaries), which is why they only run once
//! the neighborhood is resident.

use std::sync::Arc;
use tracing::debug;

use strata_common::ChunkPos;

use crate::chunk::Chunk;
use crate::world_view::WorldView;

/// Climate sample for one world column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeConditions {
    /// Normalized temperature (0.0 cold - 1.0 hot)
    pub temperature: f32,
    /// Normalized humidity (0.0 dry - 1.0 wet)
    pub humidity: f32,
}

/// Source of climate data for generators.
///
/// The world core treats biome selection as an injected collaborator; its
/// internal algorithm is out of scope here.
pub trait BiomeSource: Send + Sync {
    /// Samples the climate at a world column (block coordinates).
    fn conditions_at(&self, x: i32, z: i32) -> BiomeConditions;
}

/// First-pass generator: fills a single chunk's voxels.
pub trait ChunkGenerator: Send + Sync {
    /// Called whenever the world seed or biome source changes.
    fn configure(&mut self, seed: u64, biomes: Arc<dyn BiomeSource>);

    /// Populates the chunk. Generators run in registration order; later
    /// generators see earlier generators' output.
    fn generate(&self, chunk: &mut Chunk);
}

/// Second-pass generator: cross-chunk refinement through a world view.
pub trait SecondPassGenerator: Send + Sync {
    /// Called whenever the world seed or biome source changes.
    fn configure(&mut self, seed: u64, biomes: Arc<dyn BiomeSource>);

    /// Refines the chunk at `pos` through the view. May read and write
    /// neighboring chunks.
    fn apply(&self, pos: ChunkPos, view: &WorldView);
}

/// Orchestrates first-pass and second-pass generation.
pub struct ChunkGeneratorManager {
    seed: u64,
    biomes: Arc<dyn BiomeSource>,
    first_pass: Vec<Box<dyn ChunkGenerator>>,
    second_pass: Vec<Box<dyn SecondPassGenerator>>,
}

impl ChunkGeneratorManager {
    /// Creates an empty manager with the given seed and biome source.
    #[must_use]
    pub fn new(seed: u64, biomes: Arc<dyn BiomeSource>) -> Self {
        Self {
            seed,
            biomes,
            first_pass: Vec::new(),
            second_pass: Vec::new(),
        }
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Registers a first-pass generator, configuring it with the current
    /// seed and biome source. Registration order is application order.
    pub fn register_first_pass(&mut self, mut generator: Box<dyn ChunkGenerator>) {
        generator.configure(self.seed, Arc::clone(&self.biomes));
        self.first_pass.push(generator);
    }

    /// Registers a second-pass generator, configuring it with the current
    /// seed and biome source.
    pub fn register_second_pass(&mut self, mut generator: Box<dyn SecondPassGenerator>) {
        generator.configure(self.seed, Arc::clone(&self.biomes));
        self.second_pass.push(generator);
    }

    /// Changes the world seed and re-propagates it to every generator.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.reconfigure();
    }

    /// Changes the biome source and re-propagates it to every generator.
    pub fn set_biomes(&mut self, biomes: Arc<dyn BiomeSource>) {
        self.biomes = biomes;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        for generator in &mut self.first_pass {
            generator.configure(self.seed, Arc::clone(&self.biomes));
        }
        for generator in &mut self.second_pass {
            generator.configure(self.seed, Arc::clone(&self.biomes));
        }
    }

    /// Creates and populates a new chunk at the given position by applying
    /// every first-pass generator in order.
    #[must_use]
    pub fn generate_chunk(&self, pos: ChunkPos) -> Chunk {
        debug!(target: "strata::worldgen", ?pos, "generating chunk");
        let mut chunk = Chunk::new(pos);
        for generator in &self.first_pass {
            generator.generate(&mut chunk);
        }
        chunk.mark_clean();
        chunk
    }

    /// Applies every second-pass generator to the chunk at `pos` through the
    /// given view. The caller guarantees the view covers the neighborhood;
    /// when it cannot be constructed, second pass is deferred, not skipped.
    pub fn second_pass_chunk(&self, pos: ChunkPos, view: &WorldView) {
        debug!(target: "strata::worldgen", ?pos, "second-pass refinement");
        for generator in &self.second_pass {
            generator.apply(pos, view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_SIZE_Y;

    /// Biome source with uniform climate, for tests.
    struct UniformBiomes;

    impl BiomeSource for UniformBiomes {
        fn conditions_at(&self, _x: i32, _z: i32) -> BiomeConditions {
            BiomeConditions {
                temperature: 0.5,
                humidity: 0.5,
            }
        }
    }

    /// Writes the configured seed's low byte across one layer, to observe
    /// ordering and reconfiguration.
    struct SeedStamp {
        seed: u64,
        layer: u32,
    }

    impl ChunkGenerator for SeedStamp {
        fn configure(&mut self, seed: u64, _biomes: Arc<dyn BiomeSource>) {
            self.seed = seed;
        }

        fn generate(&self, chunk: &mut Chunk) {
            chunk.set_block(0, self.layer, 0, self.seed as u8);
        }
    }

    #[test]
    fn test_first_pass_runs_in_registration_order() {
        let mut manager = ChunkGeneratorManager::new(7, Arc::new(UniformBiomes));
        manager.register_first_pass(Box::new(SeedStamp { seed: 0, layer: 0 }));
        // Second generator overwrites the first one's layer.
        struct Overwrite;
        impl ChunkGenerator for Overwrite {
            fn configure(&mut self, _seed: u64, _biomes: Arc<dyn BiomeSource>) {}
            fn generate(&self, chunk: &mut Chunk) {
                chunk.set_block(0, 0, 0, 99);
            }
        }
        manager.register_first_pass(Box::new(Overwrite));

        let chunk = manager.generate_chunk(ChunkPos::new(0, 0, 0));
        assert_eq!(chunk.block(0, 0, 0), 99);
        assert!(!chunk.is_dirty(), "generated chunks start clean");
    }

    #[test]
    fn test_seed_change_reconfigures_generators() {
        let mut manager = ChunkGeneratorManager::new(7, Arc::new(UniformBiomes));
        manager.register_first_pass(Box::new(SeedStamp { seed: 0, layer: 1 }));

        let before = manager.generate_chunk(ChunkPos::new(0, 0, 0));
        assert_eq!(before.block(0, 1, 0), 7);

        manager.set_seed(42);
        let after = manager.generate_chunk(ChunkPos::new(0, 0, 0));
        assert_eq!(after.block(0, 1, 0), 42);
    }

    #[test]
    fn test_generated_chunk_spans_full_height() {
        let manager = ChunkGeneratorManager::new(1, Arc::new(UniformBiomes));
        let chunk = manager.generate_chunk(ChunkPos::new(3, 0, -3));
        assert_eq!(chunk.block(0, CHUNK_SIZE_Y - 1, 0), 0);
        assert_eq!(chunk.pos(), ChunkPos::new(3, 0, -3));
    }
}
