//! Far-cache chunk persistence.
//!
//! The store is the slow path and the source of truth for chunks that are
//! not resident in a provider's near-cache. Store failures never abort the
//! world: a failed load means the chunk regenerates from scratch, a failed
//! save costs that chunk's progress. Both are logged and degraded, not
//! propagated.

use dashmap::DashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use strata_common::{ChunkPos, StrataError, WorldError};

use crate::chunk::Chunk;

/// Persistence backend for chunks outside the near-cache.
pub trait ChunkStore: Send + Sync {
    /// Whether the store holds data for the given position.
    fn contains(&self, pos: ChunkPos) -> bool;

    /// Loads a chunk, or None if absent or unreadable (logged).
    fn load(&self, pos: ChunkPos) -> Option<Chunk>;

    /// Persists a chunk. Failures are logged; the chunk stays dirty.
    fn save(&self, chunk: &Chunk) -> bool;

    /// Number of chunks currently persisted.
    fn chunk_count(&self) -> usize;
}

/// File-backed chunk store: one file per chunk under a save directory.
pub struct FileChunkStore {
    save_dir: PathBuf,
}

impl FileChunkStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Returns the file path for a chunk.
    fn chunk_path(&self, pos: ChunkPos) -> PathBuf {
        self.save_dir
            .join(format!("chunk_{}_{}_{}.stch", pos.x, pos.y, pos.z))
    }

    fn read_chunk(&self, pos: ChunkPos) -> Result<Chunk, StrataError> {
        let bytes = std::fs::read(self.chunk_path(pos))?;
        Chunk::deserialize(&bytes)
            .map_err(|e| StrataError::World(WorldError::LoadFailed(e.to_string())))
    }

    fn write_chunk(&self, chunk: &Chunk) -> Result<(), StrataError> {
        std::fs::create_dir_all(&self.save_dir)?;
        let bytes = chunk
            .serialize()
            .map_err(|e| StrataError::World(WorldError::SaveFailed(e.to_string())))?;
        std::fs::write(self.chunk_path(chunk.pos()), bytes)?;
        Ok(())
    }
}

impl ChunkStore for FileChunkStore {
    fn contains(&self, pos: ChunkPos) -> bool {
        self.chunk_path(pos).exists()
    }

    fn load(&self, pos: ChunkPos) -> Option<Chunk> {
        if !self.contains(pos) {
            return None;
        }
        match self.read_chunk(pos) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!(target: "strata::store", ?pos, error = %e, "chunk load failed, will regenerate");
                None
            }
        }
    }

    fn save(&self, chunk: &Chunk) -> bool {
        match self.write_chunk(chunk) {
            Ok(()) => {
                debug!(target: "strata::store", pos = ?chunk.pos(), "chunk saved");
                true
            }
            Err(e) => {
                warn!(target: "strata::store", pos = ?chunk.pos(), error = %e, "chunk save failed");
                false
            }
        }
    }

    fn chunk_count(&self) -> usize {
        std::fs::read_dir(&self.save_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "stch"))
                    .count()
            })
            .unwrap_or(0)
    }
}

/// In-memory chunk store, for tests and remote scratch caches.
#[derive(Default)]
pub struct MemoryChunkStore {
    chunks: DashMap<ChunkPos, Vec<u8>>,
}

impl MemoryChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    fn load(&self, pos: ChunkPos) -> Option<Chunk> {
        let bytes = self.chunks.get(&pos)?;
        match Chunk::deserialize(&bytes) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!(target: "strata::store", ?pos, error = %e, "chunk load failed, will regenerate");
                None
            }
        }
    }

    fn save(&self, chunk: &Chunk) -> bool {
        match chunk.serialize() {
            Ok(bytes) => {
                self.chunks.insert(chunk.pos(), bytes);
                true
            }
            Err(e) => {
                warn!(target: "strata::store", pos = ?chunk.pos(), error = %e, "chunk save failed");
                false
            }
        }
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk(pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(pos);
        chunk.set_block(1, 2, 3, 9);
        chunk.set_sunlight(1, 2, 3, 12);
        chunk
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileChunkStore::new(dir.path());
        let pos = ChunkPos::new(2, 0, -5);

        assert!(!store.contains(pos));
        assert!(store.save(&sample_chunk(pos)));
        assert!(store.contains(pos));
        assert_eq!(store.chunk_count(), 1);

        let loaded = store.load(pos).expect("chunk");
        assert_eq!(loaded.block(1, 2, 3), 9);
        assert_eq!(loaded.sunlight(1, 2, 3), 12);
    }

    #[test]
    fn test_file_store_corrupt_data_degrades_to_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileChunkStore::new(dir.path());
        let pos = ChunkPos::new(0, 0, 0);
        std::fs::write(store.chunk_path(pos), b"not a chunk").expect("write");

        assert!(store.contains(pos));
        assert!(store.load(pos).is_none());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryChunkStore::new();
        let pos = ChunkPos::new(1, 0, 1);
        assert!(store.save(&sample_chunk(pos)));
        assert!(store.contains(pos));
        let loaded = store.load(pos).expect("chunk");
        assert_eq!(loaded.block(1, 2, 3), 9);
    }
}
