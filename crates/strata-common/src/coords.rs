//! Coordinate types for block, chunk, and chunk-local positions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Fixed chunk dimensions in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDims {
    /// Width along the X axis
    pub x: u32,
    /// Height along the Y axis
    pub y: u32,
    /// Depth along the Z axis
    pub z: u32,
}

impl ChunkDims {
    /// Creates a new set of chunk dimensions.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Number of voxels in a chunk of these dimensions.
    #[must_use]
    pub const fn volume(self) -> usize {
        (self.x as usize) * (self.y as usize) * (self.z as usize)
    }
}

/// World coordinate of a single block (global position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct BlockPos {
    /// X coordinate in world space
    pub x: i32,
    /// Y coordinate in world space
    pub y: i32,
    /// Z coordinate in world space
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts to the coordinate of the chunk containing this block.
    #[must_use]
    pub const fn to_chunk_pos(self, dims: ChunkDims) -> ChunkPos {
        ChunkPos {
            x: self.x.div_euclid(dims.x as i32),
            y: self.y.div_euclid(dims.y as i32),
            z: self.z.div_euclid(dims.z as i32),
        }
    }

    /// Converts to the chunk-local coordinate of this block.
    #[must_use]
    pub const fn to_local_pos(self, dims: ChunkDims) -> LocalPos {
        LocalPos {
            x: self.x.rem_euclid(dims.x as i32) as u16,
            y: self.y.rem_euclid(dims.y as i32) as u16,
            z: self.z.rem_euclid(dims.z as i32) as u16,
        }
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct ChunkPos {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space (0 for full-height column chunks)
    pub y: i32,
    /// Z coordinate in chunk space
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World position of this chunk's minimum-corner block.
    #[must_use]
    pub const fn block_origin(self, dims: ChunkDims) -> BlockPos {
        BlockPos {
            x: self.x * dims.x as i32,
            y: self.y * dims.y as i32,
            z: self.z * dims.z as i32,
        }
    }

    /// Grid (Manhattan, horizontal) distance to another chunk position.
    #[must_use]
    pub const fn grid_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }
}

/// Local coordinate within a chunk (0 to dimension-1 per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct LocalPos {
    /// X coordinate within chunk
    pub x: u16,
    /// Y coordinate within chunk
    pub y: u16,
    /// Z coordinate within chunk
    pub z: u16,
}

impl LocalPos {
    /// Creates a new local position.
    #[must_use]
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }
}
