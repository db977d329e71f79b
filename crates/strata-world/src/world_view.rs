//! A transient read/write window over a rectangular region of chunks.
//!
//! Views address blocks in coordinates relative to a target chunk's minimum
//! corner, so the target spans `[0, CHUNK_SIZE_*)` and neighbors are reached
//! with negative or overflowing coordinates. Cross-chunk work (second-pass
//! generation, boundary light propagation) runs against a view instead of a
//! single chunk.

use strata_common::ChunkPos;

use crate::chunk::{ChunkRef, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};

/// A read/write window spanning a rectangle of resident chunks.
///
/// Vertical extent is always the full chunk height; chunk selection only
/// considers (x, z). The view holds shared handles, so it becomes stale (but
/// not unsafe) if a referenced chunk is evicted mid-use; providers serialize
/// view work against eviction.
pub struct WorldView {
    chunks: Vec<ChunkRef>,
    size_x: i32,
    size_z: i32,
    offset_x: i32,
    offset_z: i32,
    target: ChunkPos,
}

impl WorldView {
    /// Creates the local view used for single-chunk boundary work: the
    /// target chunk plus its eight horizontal neighbors.
    ///
    /// Returns None if any covered chunk is not resident.
    pub fn local(
        target: ChunkPos,
        fetch: impl Fn(ChunkPos) -> Option<ChunkRef>,
    ) -> Option<Self> {
        Self::subview(
            ChunkPos::new(target.x - 1, target.y, target.z - 1),
            3,
            3,
            target,
            fetch,
        )
    }

    /// Creates a view over an arbitrary chunk rectangle with block
    /// coordinates relative to `target`.
    ///
    /// Returns None if any covered chunk is not resident.
    pub fn subview(
        min: ChunkPos,
        size_x: i32,
        size_z: i32,
        target: ChunkPos,
        fetch: impl Fn(ChunkPos) -> Option<ChunkRef>,
    ) -> Option<Self> {
        assert!(size_x > 0 && size_z > 0, "view must cover at least one chunk");
        let mut chunks = Vec::with_capacity((size_x * size_z) as usize);
        for gz in 0..size_z {
            for gx in 0..size_x {
                chunks.push(fetch(ChunkPos::new(min.x + gx, target.y, min.z + gz))?);
            }
        }
        Some(Self {
            chunks,
            size_x,
            size_z,
            offset_x: target.x - min.x,
            offset_z: target.z - min.z,
            target,
        })
    }

    /// The chunk whose minimum corner is the view's (0, y, 0).
    #[must_use]
    pub const fn target(&self) -> ChunkPos {
        self.target
    }

    /// Whether target-relative block (x, _, z) falls inside the view's
    /// horizontal extent.
    #[must_use]
    pub fn contains_block(&self, x: i32, z: i32) -> bool {
        let cx = x.div_euclid(CHUNK_SIZE_X as i32) + self.offset_x;
        let cz = z.div_euclid(CHUNK_SIZE_Z as i32) + self.offset_z;
        cx >= 0 && cx < self.size_x && cz >= 0 && cz < self.size_z
    }

    /// Resolves the chunk slot for target-relative block (x, _, z).
    ///
    /// # Panics
    ///
    /// Panics if the block is outside the view's horizontal extent.
    fn chunk_for(&self, x: i32, z: i32) -> &ChunkRef {
        let cx = x.div_euclid(CHUNK_SIZE_X as i32) + self.offset_x;
        let cz = z.div_euclid(CHUNK_SIZE_Z as i32) + self.offset_z;
        assert!(
            cx >= 0 && cx < self.size_x && cz >= 0 && cz < self.size_z,
            "block ({x},_,{z}) outside {}x{} view",
            self.size_x,
            self.size_z
        );
        &self.chunks[(cx + self.size_x * cz) as usize]
    }

    #[inline]
    fn local_coords(x: i32, y: i32, z: i32) -> (u32, u32, u32) {
        (
            x.rem_euclid(CHUNK_SIZE_X as i32) as u32,
            y as u32,
            z.rem_euclid(CHUNK_SIZE_Z as i32) as u32,
        )
    }

    #[inline]
    const fn y_in_bounds(y: i32) -> bool {
        y >= 0 && y < CHUNK_SIZE_Y as i32
    }

    /// Block id at target-relative coordinates. Vertical out-of-bounds
    /// queries return air rather than failing, tolerating probes just above
    /// or below the world.
    #[must_use]
    pub fn block_id(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::y_in_bounds(y) {
            return 0;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).read().block(lx, ly, lz)
    }

    /// Sunlight level at target-relative coordinates (0 above/below the
    /// world).
    #[must_use]
    pub fn sunlight(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::y_in_bounds(y) {
            return 0;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).read().sunlight(lx, ly, lz)
    }

    /// Artificial light level at target-relative coordinates (0 above/below
    /// the world).
    #[must_use]
    pub fn light(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::y_in_bounds(y) {
            return 0;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).read().light(lx, ly, lz)
    }

    /// Writes a block id through to the owning chunk, returning the previous
    /// id. Vertical out-of-bounds writes are ignored.
    pub fn set_block(&self, x: i32, y: i32, z: i32, id: u8) -> u8 {
        if !Self::y_in_bounds(y) {
            return 0;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).write().set_block(lx, ly, lz, id)
    }

    /// Writes a sunlight level through to the owning chunk (marking it
    /// light-dirty). Vertical out-of-bounds writes are ignored.
    pub fn set_sunlight(&self, x: i32, y: i32, z: i32, level: u8) {
        if !Self::y_in_bounds(y) {
            return;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).write().set_sunlight(lx, ly, lz, level);
    }

    /// Writes an artificial light level through to the owning chunk (marking
    /// it light-dirty). Vertical out-of-bounds writes are ignored.
    pub fn set_light(&self, x: i32, y: i32, z: i32, level: u8) {
        if !Self::y_in_bounds(y) {
            return;
        }
        let (lx, ly, lz) = Self::local_coords(x, y, z);
        self.chunk_for(x, z).write().set_light(lx, ly, lz, level);
    }
}
