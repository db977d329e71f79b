//! Second-pass flora generation.
//!
//! Trees are planted during the second pass because their canopies overhang
//! chunk boundaries: the generator writes through a world view, so leaves
//! land in neighboring chunks when a trunk grows near an edge.

use std::sync::Arc;
use tracing::trace;

use strata_common::ChunkPos;
use strata_world::chunk::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use strata_world::generation::{BiomeSource, SecondPassGenerator};
use strata_world::world_view::WorldView;

use crate::biome::Biome;
use crate::blocks;

/// Plants trees on grass in forested (and occasionally open) biomes.
pub struct ForestGenerator {
    seed: u64,
    biomes: Option<Arc<dyn BiomeSource>>,
    /// Chance that a candidate spot grows a tree, per biome density.
    density: f32,
    /// Candidate spots examined per chunk.
    attempts: u32,
}

impl ForestGenerator {
    /// Creates a generator with the default density.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: 0,
            biomes: None,
            density: 0.6,
            attempts: 6,
        }
    }

    /// Overrides the per-spot tree chance (tests use 1.0 for determinism).
    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.clamp(0.0, 1.0);
        self
    }

    /// Seed for one chunk's placement decisions: trees are a pure function
    /// of world seed and chunk position.
    fn chunk_rng(&self, pos: ChunkPos) -> fastrand::Rng {
        let mixed = self
            .seed
            .wrapping_add((pos.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add((pos.z as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
        fastrand::Rng::with_seed(mixed)
    }

    /// Highest grass block in a column, if its top is grass.
    fn ground_level(view: &WorldView, x: i32, z: i32) -> Option<i32> {
        for y in (1..(CHUNK_SIZE_Y as i32 - 12)).rev() {
            let id = view.block_id(x, y, z);
            if id == blocks::AIR {
                continue;
            }
            return (id == blocks::GRASS).then_some(y);
        }
        None
    }

    fn plant_tree(view: &WorldView, rng: &mut fastrand::Rng, x: i32, ground: i32, z: i32) {
        let trunk_height = rng.i32(4..7);
        for dy in 1..=trunk_height {
            view.set_block(x, ground + dy, z, blocks::WOOD);
        }
        // Canopy: two wide layers below the tip, narrowing upward.
        let top = ground + trunk_height;
        let layers: [(i32, i32); 4] = [(-1, 2), (0, 2), (1, 1), (2, 1)];
        for (dy, radius) in layers {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx == 0 && dz == 0 && dy <= 0 {
                        continue; // trunk
                    }
                    if dx.abs() == radius && dz.abs() == radius && rng.f32() < 0.4 {
                        continue; // ragged corners
                    }
                    let y = top + dy;
                    if view.block_id(x + dx, y, z + dz) == blocks::AIR {
                        view.set_block(x + dx, y, z + dz, blocks::LEAVES);
                    }
                }
            }
        }
    }
}

impl Default for ForestGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondPassGenerator for ForestGenerator {
    fn configure(&mut self, seed: u64, biomes: Arc<dyn BiomeSource>) {
        self.seed = seed;
        self.biomes = Some(biomes);
    }

    fn apply(&self, pos: ChunkPos, view: &WorldView) {
        let Some(biomes) = &self.biomes else {
            return;
        };
        let origin_x = pos.x * CHUNK_SIZE_X as i32;
        let origin_z = pos.z * CHUNK_SIZE_Z as i32;
        let mut rng = self.chunk_rng(pos);

        let mut planted = 0;
        for _ in 0..self.attempts {
            let x = rng.i32(0..CHUNK_SIZE_X as i32);
            let z = rng.i32(0..CHUNK_SIZE_Z as i32);
            let biome = Biome::from_conditions(biomes.conditions_at(origin_x + x, origin_z + z));
            let chance = match biome {
                Biome::Forest => self.density,
                Biome::Plains => self.density * 0.15,
                _ => 0.0,
            };
            if rng.f32() >= chance {
                continue;
            }
            if let Some(ground) = Self::ground_level(view, x, z) {
                Self::plant_tree(view, &mut rng, x, ground, z);
                planted += 1;
            }
        }
        if planted > 0 {
            trace!(target: "strata::worldgen", ?pos, planted, "planted trees");
        }
    }
}
