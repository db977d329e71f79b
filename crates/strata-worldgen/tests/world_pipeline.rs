//! End-to-end world pipeline: generation, second pass, lighting, access
//! through the world façade, and persistence across provider restarts.

use glam::Vec3;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use strata_common::{BlockPos, ChunkPos, EntityId};
use strata_world::chunk::{ChunkState, MAX_LIGHT};
use strata_world::config::WorldConfig;
use strata_world::generation::ChunkGeneratorManager;
use strata_world::provider::{ChunkProvider, LocalChunkProvider, LocationSource};
use strata_world::store::{ChunkStore, FileChunkStore};
use strata_world::world_provider::WorldProvider;
use strata_worldgen::{blocks, ForestGenerator, NoiseBiomeProvider, PerlinTerrainGenerator};

struct StaticLocations(HashMap<EntityId, Vec3>);

impl LocationSource for StaticLocations {
    fn location(&self, entity: EntityId) -> Option<Vec3> {
        self.0.get(&entity).copied()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strata=debug")
        .with_test_writer()
        .try_init();
}

fn build_provider(config: &WorldConfig, store: Arc<dyn ChunkStore>) -> LocalChunkProvider {
    let biomes = Arc::new(NoiseBiomeProvider::new(config.seed));
    let mut manager = ChunkGeneratorManager::new(config.seed, biomes);
    manager.register_first_pass(Box::new(PerlinTerrainGenerator::new()));
    manager.register_second_pass(Box::new(ForestGenerator::new()));
    LocalChunkProvider::new(
        config,
        Arc::new(RwLock::new(manager)),
        store,
        Arc::new(blocks::standard_registry()),
    )
}

/// Step-wise world preparation: tick the provider until the target chunk is
/// Complete instead of blocking, so a stalled pipeline fails the test rather
/// than hanging it.
fn prepare_world(
    provider: &LocalChunkProvider,
    locations: &dyn LocationSource,
    target: ChunkPos,
) {
    for _ in 0..1000 {
        provider.update(locations);
        if provider.chunk_lifecycle(target) == Some(ChunkState::Complete) {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    panic!("chunk {target:?} never reached Complete");
}

#[test]
fn test_world_pipeline_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = WorldConfig {
        seed: 4242,
        view_distance: 1,
        generation_threads: 2,
        save_dir: dir.path().to_path_buf(),
        ..WorldConfig::default()
    };
    let store: Arc<dyn ChunkStore> = Arc::new(FileChunkStore::new(dir.path()));
    let provider = Arc::new(build_provider(&config, Arc::clone(&store)));

    let player = EntityId::new();
    let spawn = Vec3::new(8.0, 80.0, 8.0);
    let locations = StaticLocations(HashMap::from([(player, spawn)]));
    provider.add_region_entity(player, config.view_distance, spawn);
    prepare_world(&provider, &locations, ChunkPos::new(0, 0, 0));

    let world = WorldProvider::new(
        provider.clone() as Arc<dyn ChunkProvider>,
        Arc::new(blocks::standard_registry()),
    );

    // Terrain: stone floor, air at the top of the world.
    assert_eq!(world.block_at(BlockPos::new(8, 0, 8)), Some(blocks::STONE));
    assert_eq!(world.block_at(BlockPos::new(8, 255, 8)), Some(blocks::AIR));

    // Lighting: open sky carries full sunlight, the sealed floor none.
    assert_eq!(world.sunlight_at(BlockPos::new(8, 250, 8)), Some(MAX_LIGHT));
    assert_eq!(world.sunlight_at(BlockPos::new(8, 0, 8)), Some(0));

    // Find the surface and place a torch just above it.
    let mut surface_y = 250;
    while world.block_at(BlockPos::new(4, surface_y, 4)) == Some(blocks::AIR) {
        surface_y -= 1;
    }
    let torch_pos = BlockPos::new(4, surface_y + 1, 4);
    world.set_block(torch_pos, blocks::TORCH);
    assert_eq!(world.light_at(torch_pos), Some(14));
    assert_eq!(
        world.light_at(BlockPos::new(torch_pos.x, torch_pos.y + 3, torch_pos.z)),
        Some(11)
    );

    // State updates are compare-and-swap.
    let state_pos = BlockPos::new(2, 100, 2);
    assert!(world.try_set_state(state_pos, 5, 0));
    assert!(!world.try_set_state(state_pos, 9, 0));
    assert_eq!(world.state_at(state_pos), Some(5));

    // Persist everything, then bring up a fresh provider on the same store:
    // the edited chunk must come back identical instead of regenerating.
    provider.save_all();
    assert!(store.contains(ChunkPos::new(0, 0, 0)));

    let reloaded_provider = build_provider(&config, Arc::clone(&store));
    let reloaded = reloaded_provider
        .chunk(ChunkPos::new(0, 0, 0))
        .expect("promoted from store");
    {
        let chunk = reloaded.read();
        assert_eq!(chunk.lifecycle(), ChunkState::Complete);
        assert_eq!(chunk.block(4, torch_pos.y as u32, 4), blocks::TORCH);
        assert_eq!(chunk.state(2, 100, 2), 5);
        assert_eq!(chunk.sunlight(8, 250, 8), MAX_LIGHT);
    }
    reloaded_provider.shutdown();
    provider.shutdown();
}

#[test]
fn test_region_follows_moving_entity() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = WorldConfig {
        seed: 7,
        view_distance: 1,
        max_loaded_chunks: 16,
        generation_threads: 2,
        save_dir: dir.path().to_path_buf(),
        ..WorldConfig::default()
    };
    let store: Arc<dyn ChunkStore> = Arc::new(FileChunkStore::new(dir.path()));
    let provider = build_provider(&config, Arc::clone(&store));

    let player = EntityId::new();
    let mut positions = HashMap::from([(player, Vec3::new(8.0, 80.0, 8.0))]);
    provider.add_region_entity(player, 1, positions[&player]);
    prepare_world(
        &provider,
        &StaticLocations(positions.clone()),
        ChunkPos::new(0, 0, 0),
    );

    // March the player several chunks east; the region follows and the new
    // center completes while the old neighborhood becomes evictable.
    positions.insert(player, Vec3::new(8.0 + 16.0 * 12.0, 80.0, 8.0));
    prepare_world(
        &provider,
        &StaticLocations(positions.clone()),
        ChunkPos::new(12, 0, 0),
    );

    let mut old_evicted = false;
    let locations = StaticLocations(positions);
    for _ in 0..1000 {
        provider.update(&locations);
        if !provider.is_chunk_available(ChunkPos::new(0, 0, 0)) {
            old_evicted = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    assert!(old_evicted, "left-behind chunk should be evicted");
    assert!(
        store.contains(ChunkPos::new(0, 0, 0)),
        "evicted chunk should be persisted"
    );
    provider.shutdown();
}
