//! Chunk data structure and serialization.
//!
//! A chunk is the unit of generation, storage, and activation: a fixed-size
//! block of the voxel world holding one packed array per attribute. Chunks
//! advance through a monotonic lifecycle as generation, second-pass
//! refinement, and light propagation complete.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use strata_common::{BlockPos, ChunkDims, ChunkPos, LocalPos, MagicBytes, SchemaVersion};

use crate::block::BlockRegistry;
use crate::voxel_array::{ByteVoxelArray, NibbleVoxelArray};

/// Chunk width along the X axis, in blocks.
pub const CHUNK_SIZE_X: u32 = 16;
/// Chunk height along the Y axis, in blocks.
pub const CHUNK_SIZE_Y: u32 = 256;
/// Chunk depth along the Z axis, in blocks.
pub const CHUNK_SIZE_Z: u32 = 16;
/// Fixed dimensions shared by every chunk.
pub const CHUNK_DIMS: ChunkDims = ChunkDims::new(CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z);
/// Maximum light level for both light channels.
pub const MAX_LIGHT: u8 = 15;

/// Shared handle to a chunk guarded by its own lock.
pub type ChunkRef = Arc<RwLock<Chunk>>;

/// Chunk errors.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// Deserialization failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
    /// Invalid magic bytes
    #[error("Invalid chunk format")]
    InvalidFormat,
    /// Version mismatch
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version
        actual: String,
    },
    /// Compression failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),
}

/// Result type for chunk operations.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Lifecycle state of a chunk. Advances monotonically; a chunk only returns
/// to an earlier state through an explicit reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChunkState {
    /// Blocks are generated; cross-chunk refinement has not run.
    AwaitingSecondPass,
    /// Second pass and internal lighting are done; boundary light has not
    /// been connected to the neighbors.
    AwaitingLightPropagation,
    /// Fully generated and lit.
    Complete,
}

impl ChunkState {
    /// Serialization ordinal.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::AwaitingSecondPass => 0,
            Self::AwaitingLightPropagation => 1,
            Self::Complete => 2,
        }
    }

    /// Parses a serialization ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::AwaitingSecondPass),
            1 => Some(Self::AwaitingLightPropagation),
            2 => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Chunk header for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHeader {
    /// Magic bytes for format identification
    pub magic: [u8; 4],
    /// Schema version
    pub version: SchemaVersion,
    /// Chunk grid position
    pub pos: ChunkPos,
    /// Chunk dimensions
    pub dims: ChunkDims,
    /// Compression type (0 = none, 1 = lz4)
    pub compression: u8,
    /// Flag bits (bit 0 = light dirty)
    pub flags: u8,
    /// Lifecycle state ordinal
    pub lifecycle: u8,
}

const FLAG_LIGHT_DIRTY: u8 = 0b0000_0001;
const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_LZ4: u8 = 1;

impl ChunkHeader {
    /// Creates a header for the given chunk.
    #[must_use]
    pub fn new(chunk: &Chunk) -> Self {
        let mut flags = 0;
        if chunk.light_dirty {
            flags |= FLAG_LIGHT_DIRTY;
        }
        Self {
            magic: MagicBytes::CHUNK.0,
            version: SchemaVersion::CHUNK_FORMAT,
            pos: chunk.pos,
            dims: CHUNK_DIMS,
            compression: COMPRESSION_LZ4,
            flags,
            lifecycle: chunk.lifecycle.ordinal(),
        }
    }

    /// Validates the header against the current schema and dimensions.
    pub fn validate(&self) -> ChunkResult<()> {
        if self.magic != MagicBytes::CHUNK.0 {
            return Err(ChunkError::InvalidFormat);
        }
        if !SchemaVersion::CHUNK_FORMAT.can_read(&self.version) {
            return Err(ChunkError::VersionMismatch {
                expected: SchemaVersion::CHUNK_FORMAT.to_string(),
                actual: self.version.to_string(),
            });
        }
        if self.dims != CHUNK_DIMS {
            return Err(ChunkError::DeserializationFailed(format!(
                "dimension mismatch: {}x{}x{}",
                self.dims.x, self.dims.y, self.dims.z
            )));
        }
        Ok(())
    }
}

/// A fixed-size block of the voxel world.
#[derive(Debug)]
pub struct Chunk {
    /// Chunk grid position
    pos: ChunkPos,
    /// Block type id per voxel
    blocks: ByteVoxelArray,
    /// Natural light level per voxel (0-15)
    sunlight: NibbleVoxelArray,
    /// Artificial light level per voxel (0-15)
    light: NibbleVoxelArray,
    /// Auxiliary block sub-state per voxel
    states: ByteVoxelArray,
    /// Whether voxel data changed since the last save
    dirty: bool,
    /// Whether light values need recomputation
    light_dirty: bool,
    /// Lifecycle state
    lifecycle: ChunkState,
}

impl Chunk {
    /// Creates an empty chunk at the given grid position.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: ByteVoxelArray::new(CHUNK_DIMS),
            sunlight: NibbleVoxelArray::new(CHUNK_DIMS),
            light: NibbleVoxelArray::new(CHUNK_DIMS),
            states: ByteVoxelArray::new(CHUNK_DIMS),
            dirty: false,
            light_dirty: true,
            lifecycle: ChunkState::AwaitingSecondPass,
        }
    }

    /// Returns the chunk grid position.
    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// World position of this chunk's minimum-corner block.
    #[must_use]
    pub const fn origin(&self) -> BlockPos {
        self.pos.block_origin(CHUNK_DIMS)
    }

    /// Converts a world block position to this chunk's local coordinates,
    /// or None if the block lies in another chunk.
    #[must_use]
    pub fn world_to_local(&self, pos: BlockPos) -> Option<LocalPos> {
        if pos.to_chunk_pos(CHUNK_DIMS) != self.pos {
            return None;
        }
        Some(pos.to_local_pos(CHUNK_DIMS))
    }

    /// World position of the given local coordinates.
    #[must_use]
    pub fn local_to_world(&self, x: u32, y: u32, z: u32) -> BlockPos {
        let origin = self.origin();
        BlockPos::new(origin.x + x as i32, origin.y + y as i32, origin.z + z as i32)
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> ChunkState {
        self.lifecycle
    }

    /// Advances the lifecycle state.
    ///
    /// # Panics
    ///
    /// Panics on a regression; lifecycle only moves forward.
    pub fn advance_lifecycle(&mut self, next: ChunkState) {
        assert!(
            next >= self.lifecycle,
            "chunk lifecycle cannot regress from {:?} to {next:?}",
            self.lifecycle
        );
        self.lifecycle = next;
    }

    /// Returns the block id at the given local coordinates.
    #[must_use]
    pub fn block(&self, x: u32, y: u32, z: u32) -> u8 {
        self.blocks.get(x, y, z)
    }

    /// Sets the block id, returning the previous one. Marks the chunk dirty
    /// on change.
    pub fn set_block(&mut self, x: u32, y: u32, z: u32, id: u8) -> u8 {
        let previous = self.blocks.set(x, y, z, id);
        if previous != id {
            self.dirty = true;
        }
        previous
    }

    /// Returns the sunlight level at the given local coordinates.
    #[must_use]
    pub fn sunlight(&self, x: u32, y: u32, z: u32) -> u8 {
        self.sunlight.get(x, y, z)
    }

    /// Sets the sunlight level, returning the previous one. Marks light
    /// dirty on change.
    pub fn set_sunlight(&mut self, x: u32, y: u32, z: u32, level: u8) -> u8 {
        let previous = self.sunlight.set(x, y, z, level);
        if previous != level & 0x0F {
            self.light_dirty = true;
        }
        previous
    }

    /// Returns the artificial light level at the given local coordinates.
    #[must_use]
    pub fn light(&self, x: u32, y: u32, z: u32) -> u8 {
        self.light.get(x, y, z)
    }

    /// Sets the artificial light level, returning the previous one. Marks
    /// light dirty on change.
    pub fn set_light(&mut self, x: u32, y: u32, z: u32, level: u8) -> u8 {
        let previous = self.light.set(x, y, z, level);
        if previous != level & 0x0F {
            self.light_dirty = true;
        }
        previous
    }

    /// Returns the block sub-state at the given local coordinates.
    #[must_use]
    pub fn state(&self, x: u32, y: u32, z: u32) -> u8 {
        self.states.get(x, y, z)
    }

    /// Sets the block sub-state only if the current value equals `expected`.
    ///
    /// Returns false and leaves the chunk unchanged when the expectation is
    /// stale, so concurrent replicated updates never merge.
    pub fn try_set_state(&mut self, x: u32, y: u32, z: u32, state: u8, expected: u8) -> bool {
        if self.states.compare_and_set(x, y, z, state, expected) {
            self.dirty = true;
            return true;
        }
        false
    }

    /// Whether any column block above (x, y, z) blocks the sky.
    #[must_use]
    pub fn can_see_sky(&self, registry: &BlockRegistry, x: u32, y: u32, z: u32) -> bool {
        for above in (y + 1)..CHUNK_SIZE_Y {
            if !registry.is_translucent(self.blocks.get(x, above, z)) {
                return false;
            }
        }
        true
    }

    /// Returns whether the chunk needs saving/remeshing.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the chunk as needing a save/remesh.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag after a save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Returns whether light values need recomputation.
    #[must_use]
    pub const fn is_light_dirty(&self) -> bool {
        self.light_dirty
    }

    /// Sets the light-dirty flag.
    pub fn set_light_dirty(&mut self, light_dirty: bool) {
        self.light_dirty = light_dirty;
    }

    /// Serializes the chunk to bytes: bincode header, then the four packed
    /// arrays (blocks, sunlight, light, states) LZ4-compressed.
    pub fn serialize(&self) -> ChunkResult<Vec<u8>> {
        let header = ChunkHeader::new(self);
        let header_bytes = bincode::serialize(&header)
            .map_err(|e| ChunkError::SerializationFailed(e.to_string()))?;

        let mut payload = Vec::with_capacity(
            self.blocks.packed_len()
                + self.sunlight.packed_len()
                + self.light.packed_len()
                + self.states.packed_len(),
        );
        payload.extend_from_slice(self.blocks.raw());
        payload.extend_from_slice(self.sunlight.raw());
        payload.extend_from_slice(self.light.raw());
        payload.extend_from_slice(self.states.raw());

        let compressed = lz4_flex::compress_prepend_size(&payload);

        let mut result = Vec::with_capacity(4 + header_bytes.len() + compressed.len());
        result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        result.extend_from_slice(&header_bytes);
        result.extend_from_slice(&compressed);
        Ok(result)
    }

    /// Deserializes a chunk from bytes.
    ///
    /// The dirty flag resets to false (the loaded data matches the store by
    /// definition); the light-dirty flag and lifecycle state round-trip.
    pub fn deserialize(bytes: &[u8]) -> ChunkResult<Self> {
        if bytes.len() < 8 {
            return Err(ChunkError::DeserializationFailed("data too short".into()));
        }

        let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < 4 + header_len {
            return Err(ChunkError::DeserializationFailed(
                "header length mismatch".into(),
            ));
        }

        let header: ChunkHeader = bincode::deserialize(&bytes[4..4 + header_len])
            .map_err(|e| ChunkError::DeserializationFailed(e.to_string()))?;
        header.validate()?;

        let body = &bytes[4 + header_len..];
        let payload = match header.compression {
            COMPRESSION_NONE => body.to_vec(),
            COMPRESSION_LZ4 => lz4_flex::decompress_size_prepended(body)
                .map_err(|e| ChunkError::CompressionFailed(e.to_string()))?,
            other => {
                return Err(ChunkError::DeserializationFailed(format!(
                    "unknown compression tag {other}"
                )))
            }
        };

        let mut chunk = Self::new(header.pos);
        let expected = chunk.blocks.packed_len()
            + chunk.sunlight.packed_len()
            + chunk.light.packed_len()
            + chunk.states.packed_len();
        if payload.len() != expected {
            return Err(ChunkError::DeserializationFailed(
                "voxel data size mismatch".into(),
            ));
        }

        let mut offset = 0;
        for raw in [
            chunk.blocks.raw_mut(),
            chunk.sunlight.raw_mut(),
            chunk.light.raw_mut(),
            chunk.states.raw_mut(),
        ] {
            raw.copy_from_slice(&payload[offset..offset + raw.len()]);
            offset += raw.len();
        }

        chunk.dirty = false;
        chunk.light_dirty = header.flags & FLAG_LIGHT_DIRTY != 0;
        chunk.lifecycle = ChunkState::from_ordinal(header.lifecycle).ok_or_else(|| {
            ChunkError::DeserializationFailed(format!(
                "unknown lifecycle ordinal {}",
                header.lifecycle
            ))
        })?;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new(ChunkPos::new(2, 0, -3));
        assert_eq!(chunk.pos(), ChunkPos::new(2, 0, -3));
        assert_eq!(chunk.lifecycle(), ChunkState::AwaitingSecondPass);
        assert!(!chunk.is_dirty());
        assert!(chunk.is_light_dirty());
        assert_eq!(chunk.block(0, 0, 0), 0);
    }

    #[test]
    fn test_set_block_marks_dirty() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        assert_eq!(chunk.set_block(3, 100, 7, 5), 0);
        assert!(chunk.is_dirty());
        chunk.mark_clean();
        // Writing the same value again is not a change.
        chunk.set_block(3, 100, 7, 5);
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn test_set_light_marks_light_dirty() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_light_dirty(false);
        chunk.set_sunlight(1, 2, 3, 9);
        assert!(chunk.is_light_dirty());
    }

    #[test]
    fn test_state_compare_and_set() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        assert!(chunk.try_set_state(4, 4, 4, 2, 0));
        assert!(!chunk.try_set_state(4, 4, 4, 3, 0));
        assert_eq!(chunk.state(4, 4, 4), 2);
    }

    #[test]
    fn test_lifecycle_advances_monotonically() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.advance_lifecycle(ChunkState::AwaitingLightPropagation);
        chunk.advance_lifecycle(ChunkState::Complete);
        assert_eq!(chunk.lifecycle(), ChunkState::Complete);
    }

    #[test]
    #[should_panic(expected = "cannot regress")]
    fn test_lifecycle_regression_panics() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.advance_lifecycle(ChunkState::Complete);
        chunk.advance_lifecycle(ChunkState::AwaitingSecondPass);
    }

    #[test]
    fn test_world_local_transforms() {
        let chunk = Chunk::new(ChunkPos::new(-1, 0, 2));
        assert_eq!(chunk.origin(), BlockPos::new(-16, 0, 32));
        assert_eq!(
            chunk.world_to_local(BlockPos::new(-1, 255, 47)),
            Some(LocalPos::new(15, 255, 15))
        );
        assert_eq!(chunk.world_to_local(BlockPos::new(0, 0, 47)), None);
        assert_eq!(chunk.local_to_world(15, 255, 15), BlockPos::new(-1, 255, 47));
    }

    #[test]
    fn test_can_see_sky() {
        let mut registry = BlockRegistry::new();
        registry.register(1, Block::opaque("stone"));
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_block(8, 100, 8, 1);
        assert!(chunk.can_see_sky(&registry, 8, 100, 8));
        assert!(!chunk.can_see_sky(&registry, 8, 99, 8));
        assert!(chunk.can_see_sky(&registry, 7, 0, 8));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut chunk = Chunk::new(ChunkPos::new(1, 0, -2));
        chunk.set_block(0, 0, 0, 7);
        chunk.set_block(15, 255, 15, 9);
        chunk.set_sunlight(3, 40, 5, 15);
        chunk.set_light(9, 9, 9, 11);
        chunk.try_set_state(2, 2, 2, 4, 0);
        chunk.advance_lifecycle(ChunkState::Complete);
        chunk.set_light_dirty(false);

        let bytes = chunk.serialize().expect("serialize failed");
        let loaded = Chunk::deserialize(&bytes).expect("deserialize failed");

        assert_eq!(loaded.pos(), chunk.pos());
        assert_eq!(loaded.lifecycle(), ChunkState::Complete);
        assert!(!loaded.is_dirty());
        assert!(!loaded.is_light_dirty());
        assert_eq!(loaded.block(0, 0, 0), 7);
        assert_eq!(loaded.block(15, 255, 15), 9);
        assert_eq!(loaded.sunlight(3, 40, 5), 15);
        assert_eq!(loaded.light(9, 9, 9), 11);
        assert_eq!(loaded.state(2, 2, 2), 4);
    }

    #[test]
    fn test_deserialize_rejects_bad_magic() {
        let chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        let mut bytes = chunk.serialize().expect("serialize failed");
        // Corrupt the magic bytes inside the header.
        bytes[4] = b'X';
        assert!(matches!(
            Chunk::deserialize(&bytes),
            Err(ChunkError::InvalidFormat)
        ));
    }

    #[test]
    fn test_deserialize_accepts_uncompressed_legacy_payload() {
        let mut chunk = Chunk::new(ChunkPos::new(4, 0, 4));
        chunk.set_block(1, 1, 1, 3);

        // Re-encode by hand with the legacy (uncompressed) tag.
        let mut header = ChunkHeader::new(&chunk);
        header.compression = 0;
        let header_bytes = bincode::serialize(&header).expect("header");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&header_bytes);
        bytes.extend_from_slice(chunk.blocks.raw());
        bytes.extend_from_slice(chunk.sunlight.raw());
        bytes.extend_from_slice(chunk.light.raw());
        bytes.extend_from_slice(chunk.states.raw());

        let loaded = Chunk::deserialize(&bytes).expect("deserialize failed");
        assert_eq!(loaded.block(1, 1, 1), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]
        #[test]
        fn prop_round_trip_preserves_voxels(
            writes in prop::collection::vec(
                (0u32..16, 0u32..256, 0u32..16, 0u8..=255, 0u8..=15),
                1..32,
            )
        ) {
            let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
            for &(x, y, z, id, level) in &writes {
                chunk.set_block(x, y, z, id);
                chunk.set_sunlight(x, y, z, level);
            }
            let bytes = chunk.serialize().expect("serialize failed");
            let loaded = Chunk::deserialize(&bytes).expect("deserialize failed");
            for &(x, y, z, _, _) in &writes {
                prop_assert_eq!(loaded.block(x, y, z), chunk.block(x, y, z));
                prop_assert_eq!(loaded.sunlight(x, y, z), chunk.sunlight(x, y, z));
            }
        }
    }
}
