//! First-pass terrain generators.

use noise::{NoiseFn, Perlin};
use std::sync::Arc;

use strata_world::chunk::{Chunk, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use strata_world::generation::{BiomeConditions, BiomeSource, ChunkGenerator};

use crate::biome::Biome;
use crate::blocks;

/// Water fills open terrain up to this height.
pub const SEA_LEVEL: u32 = 52;

/// Horizontal scale of the terrain heightmap.
const TERRAIN_SCALE: f64 = 160.0;

/// Biome-modulated Perlin heightmap terrain.
pub struct PerlinTerrainGenerator {
    terrain: Perlin,
    detail: Perlin,
    biomes: Option<Arc<dyn BiomeSource>>,
}

impl PerlinTerrainGenerator {
    /// Creates an unconfigured generator; the generator manager configures
    /// it with the world seed and biome source at registration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terrain: Perlin::new(0),
            detail: Perlin::new(1),
            biomes: None,
        }
    }

    /// Terrain height for a world column.
    fn height_at(&self, x: i32, z: i32, conditions: BiomeConditions) -> u32 {
        let sx = f64::from(x) / TERRAIN_SCALE;
        let sz = f64::from(z) / TERRAIN_SCALE;
        let base = (self.terrain.get([sx, sz]) + 1.0) / 2.0;
        let detail = (self.detail.get([sx * 4.0, sz * 4.0]) + 1.0) / 2.0;
        let normalized = (base * 0.85 + detail * 0.15).clamp(0.0, 1.0);

        let (floor, range) = match Biome::from_conditions(conditions) {
            Biome::Mountains => (60.0, 90.0),
            Biome::Desert => (46.0, 18.0),
            Biome::Snow => (50.0, 50.0),
            Biome::Plains | Biome::Forest => (44.0, 36.0),
        };
        let height = floor + normalized * range;
        (height as u32).clamp(1, CHUNK_SIZE_Y - 40)
    }

    /// Surface block for a column, by biome and height.
    fn surface_block(biome: Biome, height: u32) -> u8 {
        if height < SEA_LEVEL {
            return blocks::SAND;
        }
        match biome {
            Biome::Desert => blocks::SAND,
            Biome::Snow => blocks::SNOW,
            Biome::Mountains => {
                if height > 110 {
                    blocks::SNOW
                } else {
                    blocks::STONE
                }
            }
            Biome::Plains | Biome::Forest => blocks::GRASS,
        }
    }
}

impl Default for PerlinTerrainGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkGenerator for PerlinTerrainGenerator {
    fn configure(&mut self, seed: u64, biomes: Arc<dyn BiomeSource>) {
        self.terrain = Perlin::new(seed as u32);
        self.detail = Perlin::new((seed as u32).wrapping_add(1));
        self.biomes = Some(biomes);
    }

    fn generate(&self, chunk: &mut Chunk) {
        let origin = chunk.origin();
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                let world_x = origin.x + x as i32;
                let world_z = origin.z + z as i32;
                let conditions = match &self.biomes {
                    Some(biomes) => biomes.conditions_at(world_x, world_z),
                    None => BiomeConditions {
                        temperature: 0.5,
                        humidity: 0.5,
                    },
                };
                let biome = Biome::from_conditions(conditions);
                let height = self.height_at(world_x, world_z, conditions);
                let surface = Self::surface_block(biome, height);

                // World floor is always stone.
                chunk.set_block(x, 0, z, blocks::STONE);
                for y in 1..=height {
                    let id = if y == height {
                        surface
                    } else if y + 3 >= height && surface != blocks::STONE {
                        match surface {
                            blocks::SAND => blocks::SAND,
                            blocks::SNOW => blocks::DIRT,
                            _ => blocks::DIRT,
                        }
                    } else {
                        blocks::STONE
                    };
                    chunk.set_block(x, y, z, id);
                }
                for y in (height + 1)..=SEA_LEVEL.min(CHUNK_SIZE_Y - 1) {
                    chunk.set_block(x, y, z, blocks::WATER);
                }
            }
        }
    }
}

/// Flat slab terrain, for tests and benchmarks: stone floor, grass surface.
pub struct FlatTerrainGenerator {
    /// Height of the grass surface layer.
    pub surface_height: u32,
}

impl FlatTerrainGenerator {
    /// Creates a flat generator with the given surface height.
    #[must_use]
    pub const fn new(surface_height: u32) -> Self {
        Self { surface_height }
    }
}

impl ChunkGenerator for FlatTerrainGenerator {
    fn configure(&mut self, _seed: u64, _biomes: Arc<dyn BiomeSource>) {}

    fn generate(&self, chunk: &mut Chunk) {
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                for y in 0..self.surface_height {
                    chunk.set_block(x, y, z, blocks::STONE);
                }
                chunk.set_block(x, self.surface_height, z, blocks::GRASS);
            }
        }
    }
}
