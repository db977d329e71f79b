//! Chunk providers: near-cache residency, generation dispatch, eviction.
//!
//! A provider owns the near-cache (hot, in-memory chunks) and decides which
//! chunks must be resident by tracking cache regions around moving entities.
//! The local variant generates missing chunks and persists evicted ones to a
//! far store; the remote variant is fed fully-generated chunks from an
//! external transport.
//!
//! Threading: first-pass generation is pure and runs on worker threads. All
//! cross-chunk mutation (second pass, lighting) happens on the thread driving
//! `update()`, with the near-cache insert as the sole synchronization point
//! between the two — the first successful insert for a coordinate wins and
//! later results for it are discarded.

use ahash::AHashSet;
use crossbeam_channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use glam::Vec3;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

use strata_common::{BlockPos, ChunkPos, EntityId};

use crate::block::BlockRegistry;
use crate::chunk::{Chunk, ChunkRef, ChunkState, CHUNK_DIMS};
use crate::config::WorldConfig;
use crate::generation::ChunkGeneratorManager;
use crate::propagation::{generate_internal_lighting, LightPropagator};
use crate::store::ChunkStore;
use crate::world_view::WorldView;

/// Extra ring of chunks requested beyond each region's radius, so chunks at
/// the radius edge have the resident neighborhood their second pass and
/// light propagation require.
const PRODUCE_EXPAND: i32 = 2;
/// Extra ring kept resident beyond each region's radius before a chunk
/// becomes an eviction candidate.
const EVICT_EXPAND: i32 = 4;

/// Supplies entity position snapshots, one per update tick.
///
/// The core never reads entity state directly; an external location
/// component system implements this seam.
pub trait LocationSource {
    /// Current world position of the entity, or None if unknown.
    fn location(&self, entity: EntityId) -> Option<Vec3>;
}

/// Serves chunks by grid coordinate and manages their residency.
pub trait ChunkProvider: Send + Sync {
    /// Returns the chunk at `pos` if resident (promoting from the far store
    /// when possible), or None when it does not exist yet. Never blocks on
    /// generation; callers poll `update` until the chunk appears.
    fn chunk(&self, pos: ChunkPos) -> Option<ChunkRef>;

    /// Whether the chunk is resident in the near-cache.
    fn is_chunk_available(&self, pos: ChunkPos) -> bool;

    /// Lifecycle state of the resident chunk at `pos`, if any.
    fn chunk_lifecycle(&self, pos: ChunkPos) -> Option<ChunkState>;

    /// Registers (or re-registers) a cache region around an entity.
    /// Immediately requests residency for the region's chunks.
    fn add_region_entity(&self, entity: EntityId, distance: i32, location: Vec3);

    /// Unregisters an entity's cache region.
    fn remove_region_entity(&self, entity: EntityId);

    /// Advances the world one tick: refreshes regions from entity
    /// locations, integrates finished generation, walks resident chunks
    /// through their lifecycle, and evicts chunks outside every region.
    fn update(&self, locations: &dyn LocationSource);
}

/// Interest area around a tracked entity. Identity is the entity itself:
/// re-registering an entity replaces its region regardless of radius, which
/// is why regions live in a map keyed by entity id.
#[derive(Debug, Clone)]
struct CacheRegion {
    distance: i32,
    center: ChunkPos,
    dirty: bool,
}

impl CacheRegion {
    fn contains(&self, pos: ChunkPos, margin: i32) -> bool {
        (pos.x - self.center.x).abs() <= self.distance + margin
            && (pos.z - self.center.z).abs() <= self.distance + margin
    }
}

/// Chunk-grid center for an entity location. Chunks are full-height
/// columns, so the vertical component never selects a chunk.
fn chunk_center(location: Vec3) -> ChunkPos {
    let block = BlockPos::new(location.x.floor() as i32, 0, location.z.floor() as i32);
    block.to_chunk_pos(CHUNK_DIMS)
}

/// Authoritative chunk provider: near-cache plus far store plus generation.
pub struct LocalChunkProvider {
    near_cache: DashMap<ChunkPos, ChunkRef>,
    regions: Mutex<HashMap<EntityId, CacheRegion>>,
    /// Coordinates handed to the workers and not yet integrated.
    pending: Mutex<AHashSet<ChunkPos>>,
    store: Arc<dyn ChunkStore>,
    generators: Arc<RwLock<ChunkGeneratorManager>>,
    registry: Arc<BlockRegistry>,
    request_tx: Mutex<Option<Sender<ChunkPos>>>,
    result_rx: Receiver<Chunk>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    max_loaded_chunks: usize,
    autosave_interval: u32,
    ticks_since_save: AtomicU32,
}

impl LocalChunkProvider {
    /// Creates a provider and spawns its generation workers.
    #[must_use]
    pub fn new(
        config: &WorldConfig,
        generators: Arc<RwLock<ChunkGeneratorManager>>,
        store: Arc<dyn ChunkStore>,
        registry: Arc<BlockRegistry>,
    ) -> Self {
        let (request_tx, request_rx) = unbounded::<ChunkPos>();
        let (result_tx, result_rx) = unbounded::<Chunk>();

        let mut workers = Vec::with_capacity(config.generation_threads.max(1));
        for index in 0..config.generation_threads.max(1) {
            let request_rx = request_rx.clone();
            let result_tx = result_tx.clone();
            let generators = Arc::clone(&generators);
            let builder =
                std::thread::Builder::new().name(format!("strata-chunkgen-{index}"));
            match builder.spawn(move || {
                while let Ok(pos) = request_rx.recv() {
                    let chunk = generators.read().generate_chunk(pos);
                    if result_tx.send(chunk).is_err() {
                        break;
                    }
                }
            }) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::warn!(target: "strata::provider", error = %e, "failed to spawn generation worker");
                }
            }
        }

        Self {
            near_cache: DashMap::new(),
            regions: Mutex::new(HashMap::new()),
            pending: Mutex::new(AHashSet::new()),
            store,
            generators,
            registry,
            request_tx: Mutex::new(Some(request_tx)),
            result_rx,
            workers: Mutex::new(workers),
            max_loaded_chunks: config.max_loaded_chunks,
            autosave_interval: config.autosave_interval,
            ticks_since_save: AtomicU32::new(0),
        }
    }

    /// Number of chunks resident in the near-cache.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.near_cache.len()
    }

    /// Persists every dirty resident chunk. Returns how many were saved.
    pub fn save_all(&self) -> usize {
        let mut saved = 0;
        for entry in self.near_cache.iter() {
            let mut chunk = entry.value().write();
            if chunk.is_dirty() && self.store.save(&chunk) {
                chunk.mark_clean();
                saved += 1;
            }
        }
        if saved > 0 {
            info!(target: "strata::provider", saved, "saved dirty chunks");
        }
        saved
    }

    /// Flushes dirty chunks and joins the generation workers. Called from
    /// Drop as well; safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(tx) = self.request_tx.lock().take() {
            drop(tx);
        }
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
        // Integrate whatever the workers finished before exiting.
        while let Ok(chunk) = self.result_rx.try_recv() {
            let pos = chunk.pos();
            self.pending.lock().remove(&pos);
            self.insert_first_wins(pos, chunk);
        }
        self.save_all();
    }

    /// Inserts a chunk unless the coordinate is already resident; either
    /// way, returns the single resident instance for the coordinate.
    fn insert_first_wins(&self, pos: ChunkPos, chunk: Chunk) -> ChunkRef {
        match self.near_cache.entry(pos) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Arc::clone(entry.get()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let chunk_ref: ChunkRef = Arc::new(RwLock::new(chunk));
                entry.insert(Arc::clone(&chunk_ref));
                chunk_ref
            }
        }
    }

    /// Ensures every chunk within `radius` of `center` is resident,
    /// promoted from the far store, or queued for generation.
    fn request_region(&self, center: ChunkPos, radius: i32) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let pos = ChunkPos::new(center.x + dx, 0, center.z + dz);
                if self.near_cache.contains_key(&pos) {
                    continue;
                }
                if let Some(chunk) = self.store.load(pos) {
                    self.insert_first_wins(pos, chunk);
                    continue;
                }
                let mut pending = self.pending.lock();
                if pending.insert(pos) {
                    if let Some(tx) = self.request_tx.lock().as_ref() {
                        let _ = tx.send(pos);
                    }
                }
            }
        }
    }

    fn fetch_resident(&self, pos: ChunkPos) -> Option<ChunkRef> {
        self.near_cache.get(&pos).map(|c| Arc::clone(c.value()))
    }

    /// Advances one chunk through its lifecycle if its neighborhood allows.
    fn check_chunk_state(&self, pos: ChunkPos) {
        let Some(chunk_ref) = self.fetch_resident(pos) else {
            return;
        };
        let lifecycle = chunk_ref.read().lifecycle();
        match lifecycle {
            ChunkState::AwaitingSecondPass => self.try_second_pass(pos, &chunk_ref),
            ChunkState::AwaitingLightPropagation => self.try_propagate_light(pos, &chunk_ref),
            ChunkState::Complete => {}
        }
    }

    fn try_second_pass(&self, pos: ChunkPos, chunk_ref: &ChunkRef) {
        let Some(view) = WorldView::local(pos, |p| self.fetch_resident(p)) else {
            // Neighborhood incomplete; retried on a later tick.
            return;
        };
        self.generators.read().second_pass_chunk(pos, &view);
        let mut chunk = chunk_ref.write();
        generate_internal_lighting(&mut chunk, &self.registry);
        chunk.advance_lifecycle(ChunkState::AwaitingLightPropagation);
        debug!(target: "strata::provider", ?pos, "second pass done");
    }

    fn try_propagate_light(&self, pos: ChunkPos, chunk_ref: &ChunkRef) {
        // Neighbors must have their internal lighting before boundary light
        // can be connected.
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let neighbor = ChunkPos::new(pos.x + dx, pos.y, pos.z + dz);
                match self.fetch_resident(neighbor) {
                    Some(c) if c.read().lifecycle() >= ChunkState::AwaitingLightPropagation => {}
                    _ => return,
                }
            }
        }
        let Some(view) = WorldView::local(pos, |p| self.fetch_resident(p)) else {
            return;
        };
        LightPropagator::new(&view, &self.registry).propagate_out_of_target_chunk();
        let mut chunk = chunk_ref.write();
        chunk.set_light_dirty(false);
        chunk.advance_lifecycle(ChunkState::Complete);
        debug!(target: "strata::provider", ?pos, "chunk complete");
    }

    fn evict_out_of_range(&self) {
        if self.near_cache.len() <= self.max_loaded_chunks {
            return;
        }
        let regions: Vec<CacheRegion> = self.regions.lock().values().cloned().collect();
        let candidates: Vec<ChunkPos> = self
            .near_cache
            .iter()
            .map(|entry| *entry.key())
            .filter(|pos| !regions.iter().any(|r| r.contains(*pos, EVICT_EXPAND)))
            .collect();
        let mut evicted = 0;
        for pos in candidates {
            let removed = self.near_cache.remove_if(&pos, |_, chunk_ref| {
                let mut chunk = chunk_ref.write();
                // Never evict a chunk still being built.
                if chunk.lifecycle() != ChunkState::Complete {
                    return false;
                }
                // Evicted chunks always go to the far store; if persisting
                // fails the chunk stays resident rather than losing data.
                if !self.store.save(&chunk) {
                    return false;
                }
                chunk.mark_clean();
                true
            });
            if removed.is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(target: "strata::provider", evicted, "compacted near-cache");
        }
    }
}

impl ChunkProvider for LocalChunkProvider {
    fn chunk(&self, pos: ChunkPos) -> Option<ChunkRef> {
        if let Some(chunk) = self.fetch_resident(pos) {
            return Some(chunk);
        }
        // Far-store hit promotes into the near-cache; a concurrent promotion
        // for the same coordinate wins and this copy is discarded.
        let loaded = self.store.load(pos)?;
        Some(self.insert_first_wins(pos, loaded))
    }

    fn is_chunk_available(&self, pos: ChunkPos) -> bool {
        self.near_cache.contains_key(&pos)
    }

    fn chunk_lifecycle(&self, pos: ChunkPos) -> Option<ChunkState> {
        self.fetch_resident(pos).map(|c| c.read().lifecycle())
    }

    fn add_region_entity(&self, entity: EntityId, distance: i32, location: Vec3) {
        let center = chunk_center(location);
        info!(target: "strata::provider", ?entity, distance, ?center, "tracking region entity");
        self.regions.lock().insert(
            entity,
            CacheRegion {
                distance,
                center,
                dirty: false,
            },
        );
        self.request_region(center, distance + PRODUCE_EXPAND);
    }

    fn remove_region_entity(&self, entity: EntityId) {
        info!(target: "strata::provider", ?entity, "dropping region entity");
        self.regions.lock().remove(&entity);
    }

    fn update(&self, locations: &dyn LocationSource) {
        // Integrate finished first-pass generation.
        while let Ok(chunk) = self.result_rx.try_recv() {
            let pos = chunk.pos();
            self.pending.lock().remove(&pos);
            self.insert_first_wins(pos, chunk);
        }

        // Re-derive region centers from entity locations.
        let mut to_request = Vec::new();
        {
            let mut regions = self.regions.lock();
            for (entity, region) in regions.iter_mut() {
                let Some(location) = locations.location(*entity) else {
                    continue;
                };
                let center = chunk_center(location);
                if center != region.center {
                    region.center = center;
                    region.dirty = true;
                }
                if region.dirty {
                    region.dirty = false;
                    to_request.push((center, region.distance + PRODUCE_EXPAND));
                }
            }
        }
        for (center, radius) in to_request {
            self.request_region(center, radius);
        }

        // Walk resident chunks through the lifecycle state machine.
        let unfinished: Vec<ChunkPos> = self
            .near_cache
            .iter()
            .filter(|entry| entry.value().read().lifecycle() != ChunkState::Complete)
            .map(|entry| *entry.key())
            .collect();
        for pos in unfinished {
            self.check_chunk_state(pos);
        }

        self.evict_out_of_range();

        let ticks = self.ticks_since_save.fetch_add(1, Ordering::Relaxed) + 1;
        if ticks >= self.autosave_interval {
            self.ticks_since_save.store(0, Ordering::Relaxed);
            self.save_all();
        }
    }
}

impl Drop for LocalChunkProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Client-side chunk provider: serves chunks received from an external
/// transport. Never generates or persists; chunks that fall out of every
/// region are simply dropped and re-requested by the transport layer.
#[derive(Default)]
pub struct RemoteChunkProvider {
    near_cache: DashMap<ChunkPos, ChunkRef>,
    regions: Mutex<HashMap<EntityId, CacheRegion>>,
}

impl RemoteChunkProvider {
    /// Creates an empty remote provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrates a chunk received from the transport. If the coordinate is
    /// already resident the existing instance is kept and returned.
    pub fn receive_chunk(&self, chunk: Chunk) -> ChunkRef {
        let pos = chunk.pos();
        match self.near_cache.entry(pos) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Arc::clone(entry.get()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(target: "strata::provider", ?pos, "received remote chunk");
                let chunk_ref: ChunkRef = Arc::new(RwLock::new(chunk));
                entry.insert(Arc::clone(&chunk_ref));
                chunk_ref
            }
        }
    }

    /// Number of chunks resident in the near-cache.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.near_cache.len()
    }
}

impl ChunkProvider for RemoteChunkProvider {
    fn chunk(&self, pos: ChunkPos) -> Option<ChunkRef> {
        self.near_cache.get(&pos).map(|c| Arc::clone(c.value()))
    }

    fn is_chunk_available(&self, pos: ChunkPos) -> bool {
        self.near_cache.contains_key(&pos)
    }

    fn chunk_lifecycle(&self, pos: ChunkPos) -> Option<ChunkState> {
        self.chunk(pos).map(|c| c.read().lifecycle())
    }

    fn add_region_entity(&self, entity: EntityId, distance: i32, location: Vec3) {
        self.regions.lock().insert(
            entity,
            CacheRegion {
                distance,
                center: chunk_center(location),
                dirty: false,
            },
        );
    }

    fn remove_region_entity(&self, entity: EntityId) {
        self.regions.lock().remove(&entity);
    }

    fn update(&self, locations: &dyn LocationSource) {
        {
            let mut regions = self.regions.lock();
            for (entity, region) in regions.iter_mut() {
                if let Some(location) = locations.location(*entity) {
                    region.center = chunk_center(location);
                }
            }
        }
        let regions: Vec<CacheRegion> = self.regions.lock().values().cloned().collect();
        self.near_cache
            .retain(|pos, _| regions.iter().any(|r| r.contains(*pos, EVICT_EXPAND)));
    }
}
