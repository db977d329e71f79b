//! Biome selection from noise-driven climate fields.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use strata_world::generation::{BiomeConditions, BiomeSource};

/// Horizontal scale of the climate fields (larger = broader biomes).
const CLIMATE_SCALE: f64 = 512.0;

/// Biomes produced by the bundled generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Biome {
    /// Open grassland with sparse trees.
    #[default]
    Plains,
    /// Dense tree coverage, moderate humidity.
    Forest,
    /// Hot and dry, sand everywhere.
    Desert,
    /// High, rocky terrain.
    Mountains,
    /// Cold, snow-covered ground.
    Snow,
}

impl Biome {
    /// Get the display name for this biome.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Plains => "Plains",
            Self::Forest => "Forest",
            Self::Desert => "Desert",
            Self::Mountains => "Mountains",
            Self::Snow => "Snow",
        }
    }

    /// Selects a biome from a climate sample.
    #[must_use]
    pub fn from_conditions(conditions: BiomeConditions) -> Self {
        if conditions.temperature < 0.25 {
            Self::Snow
        } else if conditions.temperature > 0.7 && conditions.humidity < 0.35 {
            Self::Desert
        } else if conditions.humidity < 0.3 {
            Self::Mountains
        } else if conditions.humidity > 0.55 {
            Self::Forest
        } else {
            Self::Plains
        }
    }
}

/// Climate source backed by two Perlin fields, deterministic per seed.
pub struct NoiseBiomeProvider {
    temperature: Perlin,
    humidity: Perlin,
}

impl NoiseBiomeProvider {
    /// Creates a provider for the given world seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            temperature: Perlin::new(seed as u32),
            humidity: Perlin::new((seed as u32).wrapping_add(0x9E37)),
        }
    }

    /// Biome at a world column.
    #[must_use]
    pub fn biome_at(&self, x: i32, z: i32) -> Biome {
        Biome::from_conditions(self.conditions_at(x, z))
    }
}

impl BiomeSource for NoiseBiomeProvider {
    fn conditions_at(&self, x: i32, z: i32) -> BiomeConditions {
        let sx = f64::from(x) / CLIMATE_SCALE;
        let sz = f64::from(z) / CLIMATE_SCALE;
        BiomeConditions {
            temperature: ((self.temperature.get([sx, sz]) + 1.0) / 2.0) as f32,
            humidity: ((self.humidity.get([sx, sz]) + 1.0) / 2.0) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(temperature: f32, humidity: f32) -> BiomeConditions {
        BiomeConditions {
            temperature,
            humidity,
        }
    }

    #[test]
    fn test_biome_selection() {
        assert_eq!(Biome::from_conditions(conditions(0.1, 0.5)), Biome::Snow);
        assert_eq!(Biome::from_conditions(conditions(0.8, 0.2)), Biome::Desert);
        assert_eq!(Biome::from_conditions(conditions(0.5, 0.2)), Biome::Mountains);
        assert_eq!(Biome::from_conditions(conditions(0.5, 0.7)), Biome::Forest);
        assert_eq!(Biome::from_conditions(conditions(0.5, 0.4)), Biome::Plains);
    }

    #[test]
    fn test_same_seed_same_climate() {
        let a = NoiseBiomeProvider::new(42);
        let b = NoiseBiomeProvider::new(42);
        for &(x, z) in &[(0, 0), (1000, -500), (-12345, 678)] {
            assert_eq!(a.conditions_at(x, z), b.conditions_at(x, z));
            assert_eq!(a.biome_at(x, z), b.biome_at(x, z));
        }
    }

    #[test]
    fn test_conditions_are_normalized() {
        let provider = NoiseBiomeProvider::new(7);
        for x in (-2000..2000).step_by(97) {
            let c = provider.conditions_at(x, -x);
            assert!((0.0..=1.0).contains(&c.temperature));
            assert!((0.0..=1.0).contains(&c.humidity));
        }
    }
}
