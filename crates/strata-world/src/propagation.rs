//! Flood-fill light propagation.
//!
//! Two independent light fields share one propagation shape: sunlight decays
//! by one per step except for vertical movement at full strength, and
//! artificial light decays by one per step in every direction. Propagation is
//! monotonic — it only ever raises a voxel's stored level — so each pass
//! terminates after at most `MAX_LIGHT` hops along any path.
//!
//! The fill runs over an explicit work queue rather than recursion: the
//! result is identical and the depth of pathological fills stops being a
//! stack concern.

use std::collections::VecDeque;
use tracing::trace;

use crate::block::BlockRegistry;
use crate::chunk::{Chunk, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, MAX_LIGHT};
use crate::world_view::WorldView;

/// The four horizontal propagation directions (no diagonals).
const HORIZONTAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Flood-fill light propagator operating over a world view.
///
/// The view is expected to be target-centered so the chunk being connected
/// is addressed as `[0, CHUNK_SIZE_*)`.
pub struct LightPropagator<'a> {
    view: &'a WorldView,
    registry: &'a BlockRegistry,
}

impl<'a> LightPropagator<'a> {
    /// Creates a propagator over the given view.
    #[must_use]
    pub const fn new(view: &'a WorldView, registry: &'a BlockRegistry) -> Self {
        Self { view, registry }
    }

    /// Propagates light out of the target chunk, connecting it to the
    /// surrounding chunks.
    ///
    /// Seeds propagation from every voxel on the four vertical side faces of
    /// the target chunk. Top and bottom faces are skipped: vertical spread
    /// stays within a full-height column chunk.
    pub fn propagate_out_of_target_chunk(&self) {
        let max_x = CHUNK_SIZE_X as i32 - 1;
        let max_z = CHUNK_SIZE_Z as i32 - 1;
        trace!(target: "strata::light", chunk = ?self.view.target(), "connecting chunk boundary light");
        for y in 0..CHUNK_SIZE_Y as i32 {
            for x in 0..=max_x {
                self.propagate_sunlight_from(x, y, 0);
                self.propagate_sunlight_from(x, y, max_z);
                self.propagate_light_from(x, y, 0);
                self.propagate_light_from(x, y, max_z);
            }
            for z in 0..=max_z {
                self.propagate_sunlight_from(0, y, z);
                self.propagate_sunlight_from(max_x, y, z);
                self.propagate_light_from(0, y, z);
                self.propagate_light_from(max_x, y, z);
            }
        }
    }

    /// Spreads sunlight outward from one voxel.
    ///
    /// Vertical movement carries full strength while the level is at
    /// `MAX_LIGHT` and decays by one below it; horizontal movement always
    /// decays by one and is only attempted from levels above one (a
    /// sideways step from level one would write zero, a no-op). A voxel is
    /// only ever raised, and only translucent voxels admit light.
    pub fn propagate_sunlight_from(&self, x: i32, y: i32, z: i32) {
        let level = self.view.sunlight(x, y, z);
        if level == 0 {
            return;
        }
        let mut queue = VecDeque::new();
        queue.push_back((x, y, z, level));
        while let Some((px, py, pz, lvl)) = queue.pop_front() {
            // Vertical: exempt from decay at full strength.
            let carried = if lvl == MAX_LIGHT { MAX_LIGHT } else { lvl - 1 };
            for dy in [-1, 1] {
                let ny = py + dy;
                if carried > 0 && self.admits_sunlight(px, ny, pz, carried) {
                    self.view.set_sunlight(px, ny, pz, carried);
                    queue.push_back((px, ny, pz, carried));
                }
            }
            // Horizontal: always decays, dies out at level one.
            if lvl > 1 {
                let side = lvl - 1;
                for (dx, dz) in HORIZONTAL {
                    let (nx, nz) = (px + dx, pz + dz);
                    if self.view.contains_block(nx, nz)
                        && self.admits_sunlight(nx, py, nz, side)
                    {
                        self.view.set_sunlight(nx, py, nz, side);
                        queue.push_back((nx, py, nz, side));
                    }
                }
            }
        }
    }

    /// Spreads artificial light outward from one voxel.
    ///
    /// Same queue shape as sunlight without the full-strength vertical
    /// exemption: every step decays by one in all six directions.
    pub fn propagate_light_from(&self, x: i32, y: i32, z: i32) {
        let level = self.view.light(x, y, z);
        if level <= 1 {
            return;
        }
        let mut queue = VecDeque::new();
        queue.push_back((x, y, z, level));
        while let Some((px, py, pz, lvl)) = queue.pop_front() {
            let carried = lvl - 1;
            if carried == 0 {
                continue;
            }
            for (dx, dy, dz) in [
                (1, 0, 0),
                (-1, 0, 0),
                (0, 1, 0),
                (0, -1, 0),
                (0, 0, 1),
                (0, 0, -1),
            ] {
                let (nx, ny, nz) = (px + dx, py + dy, pz + dz);
                if (dy == 0 && !self.view.contains_block(nx, nz))
                    || !self.admits_light(nx, ny, nz, carried)
                {
                    continue;
                }
                self.view.set_light(nx, ny, nz, carried);
                queue.push_back((nx, ny, nz, carried));
            }
        }
    }

    /// Relights the neighborhood of a block change.
    ///
    /// Both channels are maintained: sunlight reacts to translucency
    /// changes, artificial light to translucency and luminance changes.
    pub fn update_block_change(&self, x: i32, y: i32, z: i32, new_id: u8, old_id: u8) {
        self.update_sunlight_change(x, y, z, new_id, old_id);
        self.update_light_change(x, y, z, new_id, old_id);
    }

    fn update_sunlight_change(&self, x: i32, y: i32, z: i32, new_id: u8, old_id: u8) {
        let new_translucent = self.registry.is_translucent(new_id);
        if new_translucent == self.registry.is_translucent(old_id) {
            return;
        }
        if new_translucent {
            let level = self.pull_sunlight(x, y, z);
            self.view.set_sunlight(x, y, z, level);
            if level > 1 {
                self.propagate_sunlight_from(x, y, z);
            }
        } else {
            self.clear_sunlight(x, y, z);
        }
    }

    fn update_light_change(&self, x: i32, y: i32, z: i32, new_id: u8, old_id: u8) {
        let current = self.view.light(x, y, z);
        let luminance = self.registry.luminance(new_id);
        let new_translucent = self.registry.is_translucent(new_id);
        let old_translucent = self.registry.is_translucent(old_id);

        if new_translucent && !old_translucent && luminance >= current {
            // Newly transparent and no brighter than before: draw in
            // surrounding light, then push it back out.
            let level = self.pull_light(x, y, z, luminance);
            self.view.set_light(x, y, z, level);
            self.propagate_light_from(x, y, z);
        } else if luminance > current {
            self.view.set_light(x, y, z, luminance);
            self.propagate_light_from(x, y, z);
        } else if luminance < current && self.registry.luminance(old_id) == current {
            // The old block was the source; drop the field and rebuild.
            self.clear_light(x, y, z, current);
        }
    }

    /// Brightest sunlight this voxel can claim from its neighbors: full
    /// strength from directly above, decayed by one from below and the
    /// sides. The top of the world always claims full strength.
    fn pull_sunlight(&self, x: i32, y: i32, z: i32) -> u8 {
        if y == CHUNK_SIZE_Y as i32 - 1 {
            return MAX_LIGHT;
        }
        let mut level = self.view.sunlight(x, y + 1, z);
        level = level.max(self.view.sunlight(x, y - 1, z).saturating_sub(1));
        for (dx, dz) in HORIZONTAL {
            if self.view.contains_block(x + dx, z + dz) {
                level = level.max(self.view.sunlight(x + dx, y, z + dz).saturating_sub(1));
            }
        }
        level
    }

    /// Brightest artificial light this voxel can claim: its own luminance or
    /// any neighbor's level decayed by one.
    fn pull_light(&self, x: i32, y: i32, z: i32, luminance: u8) -> u8 {
        let mut level = luminance;
        for (dx, dy, dz) in [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ] {
            if dy == 0 && !self.view.contains_block(x + dx, z + dz) {
                continue;
            }
            level = level.max(self.view.light(x + dx, y + dy, z + dz).saturating_sub(1));
        }
        level
    }

    /// Clears sunlight after a voxel turned opaque and rebuilds the
    /// surrounding field.
    fn clear_sunlight(&self, x: i32, y: i32, z: i32) {
        let old = self.view.sunlight(x, y, z);
        self.view.set_sunlight(x, y, z, 0);
        if old == MAX_LIGHT {
            // A sky column was cut: everything below the change lost its
            // source, so the whole affected prism is recomputed.
            self.full_recalculate_sunlight_around(x, y, z);
        } else if old > 1 {
            self.local_recalculate_sunlight(x, y, z, old);
        }
    }

    /// Zeroes the diamond the lost level could have reached, then re-pushes
    /// from every voxel in or just outside it that stayed bright. Sky-backed
    /// voxels (at `MAX_LIGHT`) keep their value; a severed sky column never
    /// holds `MAX_LIGHT` here because [`clear_sunlight`] routes that case to
    /// the full recalculation.
    fn local_recalculate_sunlight(&self, x: i32, y: i32, z: i32, old: u8) {
        let radius = i32::from(old);
        for (px, py, pz) in diamond(x, y, z, radius - 1) {
            if self.view.contains_block(px, pz)
                && self.registry.is_translucent(self.view.block_id(px, py, pz))
                && self.view.sunlight(px, py, pz) < MAX_LIGHT
            {
                self.view.set_sunlight(px, py, pz, 0);
            }
        }
        for (px, py, pz) in diamond(x, y, z, radius) {
            if self.view.contains_block(px, pz) && self.view.sunlight(px, py, pz) > 1 {
                self.propagate_sunlight_from(px, py, pz);
            }
        }
    }

    /// Recomputes sunlight in the prism a severed sky column could have fed:
    /// clears a diamond-footprint column spanning the change and the open
    /// column below it, then draws light back in from the kept layer above,
    /// from below, and from the footprint's boundary columns.
    fn full_recalculate_sunlight_around(&self, x: i32, y: i32, z: i32) {
        let height = CHUNK_SIZE_Y as i32;
        let reach = i32::from(MAX_LIGHT);

        // Bottom of the column that was lit through the changed voxel.
        let mut column_bottom = y - 1;
        while column_bottom >= 0
            && self.registry.is_translucent(self.view.block_id(x, column_bottom, z))
        {
            column_bottom -= 1;
        }
        column_bottom += 1;

        let y_max = (y + reach).min(height - 1);
        let y_min = (column_bottom - reach + 1).max(0);

        // Clear the prism; the y_max layer is kept as the relight source.
        for off_x in (1 - reach)..reach {
            let z_range = reach - off_x.abs();
            for off_z in (1 - z_range)..z_range {
                if !self.view.contains_block(x + off_x, z + off_z) {
                    continue;
                }
                for col_y in y_min..y_max {
                    self.view.set_sunlight(x + off_x, col_y, z + off_z, 0);
                }
            }
        }

        // Draw light back down from the kept layer.
        for off_x in (1 - reach)..reach {
            let z_range = reach - off_x.abs();
            for off_z in (1 - z_range)..z_range {
                if self.view.contains_block(x + off_x, z + off_z)
                    && self.view.sunlight(x + off_x, y_max, z + off_z) > 1
                {
                    self.propagate_sunlight_from(x + off_x, y_max, z + off_z);
                }
            }
        }

        // Push light up from below the prism.
        if y_min > 0 {
            for off_x in (1 - reach)..reach {
                let z_range = reach - off_x.abs();
                for off_z in (1 - z_range)..z_range {
                    if self.view.contains_block(x + off_x, z + off_z)
                        && self.view.sunlight(x + off_x, y_min - 1, z + off_z) > 1
                    {
                        self.propagate_sunlight_from(x + off_x, y_min - 1, z + off_z);
                    }
                }
            }
        }

        // Push light in from the boundary columns around the footprint.
        for off_x in -reach..=reach {
            let off_z_abs = reach - off_x.abs();
            let sides: &[i32] = if off_z_abs == 0 {
                &[0]
            } else {
                &[1, -1]
            };
            for sign in sides {
                let off_z = off_z_abs * sign;
                if !self.view.contains_block(x + off_x, z + off_z) {
                    continue;
                }
                for col_y in y_min..y_max {
                    if self.view.sunlight(x + off_x, col_y, z + off_z) > 1 {
                        self.propagate_sunlight_from(x + off_x, col_y, z + off_z);
                    }
                }
            }
        }
    }

    /// Clears artificial light around a removed/dimmed source and rebuilds
    /// from remaining sources and the surrounding field.
    fn clear_light(&self, x: i32, y: i32, z: i32, old: u8) {
        let radius = i32::from(old);
        let mut sources = Vec::new();
        for (px, py, pz) in diamond(x, y, z, radius - 1) {
            if !self.view.contains_block(px, pz) {
                continue;
            }
            let luminance = self.registry.luminance(self.view.block_id(px, py, pz));
            self.view.set_light(px, py, pz, luminance);
            if luminance > 1 {
                sources.push((px, py, pz));
            }
        }
        for (px, py, pz) in sources {
            self.propagate_light_from(px, py, pz);
        }
        for (px, py, pz) in diamond_shell(x, y, z, radius) {
            if self.view.contains_block(px, pz) && self.view.light(px, py, pz) > 1 {
                self.propagate_light_from(px, py, pz);
            }
        }
    }

    fn admits_sunlight(&self, x: i32, y: i32, z: i32, level: u8) -> bool {
        y >= 0
            && y < CHUNK_SIZE_Y as i32
            && self.view.sunlight(x, y, z) < level
            && self.registry.is_translucent(self.view.block_id(x, y, z))
    }

    fn admits_light(&self, x: i32, y: i32, z: i32, level: u8) -> bool {
        y >= 0
            && y < CHUNK_SIZE_Y as i32
            && self.view.light(x, y, z) < level
            && self.registry.is_translucent(self.view.block_id(x, y, z))
    }
}

/// Generates a freshly-built chunk's internal lighting: every column open to
/// the sky carries full sunlight down to the first visible block, luminous
/// blocks seed the artificial channel, and both fields spread within the
/// chunk. Cross-chunk connection happens later through a world view.
pub fn generate_internal_lighting(chunk: &mut Chunk, registry: &BlockRegistry) {
    let (sx, sy, sz) = (CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z);

    // Sky columns: full sunlight until the column is covered.
    for x in 0..sx {
        for z in 0..sz {
            let mut covered = false;
            for y in (0..sy).rev() {
                let block = registry.get(chunk.block(x, y, z));
                if !covered && !block.invisible {
                    covered = true;
                }
                chunk.set_sunlight(x, y, z, if covered { 0 } else { MAX_LIGHT });
            }
        }
    }

    // Luminous blocks seed the artificial channel.
    let mut queue = VecDeque::new();
    for x in 0..sx {
        for y in 0..sy {
            for z in 0..sz {
                let luminance = registry.luminance(chunk.block(x, y, z));
                if luminance > 0 {
                    chunk.set_light(x, y, z, luminance);
                    queue.push_back((x as i32, y as i32, z as i32, luminance));
                }
            }
        }
    }
    spread_light_in_chunk(chunk, registry, queue);

    // Spread sunlight sideways into overhangs and cave mouths.
    let mut sun_queue = VecDeque::new();
    for x in 0..sx {
        for y in 0..sy {
            for z in 0..sz {
                let level = chunk.sunlight(x, y, z);
                if level > 1 {
                    sun_queue.push_back((x as i32, y as i32, z as i32, level));
                }
            }
        }
    }
    spread_sunlight_in_chunk(chunk, registry, sun_queue);
}

fn in_chunk(x: i32, y: i32, z: i32) -> bool {
    x >= 0
        && x < CHUNK_SIZE_X as i32
        && y >= 0
        && y < CHUNK_SIZE_Y as i32
        && z >= 0
        && z < CHUNK_SIZE_Z as i32
}

fn spread_sunlight_in_chunk(
    chunk: &mut Chunk,
    registry: &BlockRegistry,
    mut queue: VecDeque<(i32, i32, i32, u8)>,
) {
    while let Some((px, py, pz, lvl)) = queue.pop_front() {
        let carried = if lvl == MAX_LIGHT { MAX_LIGHT } else { lvl - 1 };
        for dy in [-1, 1] {
            let ny = py + dy;
            if carried > 0
                && in_chunk(px, ny, pz)
                && chunk.sunlight(px as u32, ny as u32, pz as u32) < carried
                && registry.is_translucent(chunk.block(px as u32, ny as u32, pz as u32))
            {
                chunk.set_sunlight(px as u32, ny as u32, pz as u32, carried);
                queue.push_back((px, ny, pz, carried));
            }
        }
        if lvl > 1 {
            let side = lvl - 1;
            for (dx, dz) in HORIZONTAL {
                let (nx, nz) = (px + dx, pz + dz);
                if in_chunk(nx, py, nz)
                    && chunk.sunlight(nx as u32, py as u32, nz as u32) < side
                    && registry.is_translucent(chunk.block(nx as u32, py as u32, nz as u32))
                {
                    chunk.set_sunlight(nx as u32, py as u32, nz as u32, side);
                    queue.push_back((nx, py, nz, side));
                }
            }
        }
    }
}

fn spread_light_in_chunk(
    chunk: &mut Chunk,
    registry: &BlockRegistry,
    mut queue: VecDeque<(i32, i32, i32, u8)>,
) {
    while let Some((px, py, pz, lvl)) = queue.pop_front() {
        if lvl <= 1 {
            continue;
        }
        let carried = lvl - 1;
        for (dx, dy, dz) in [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ] {
            let (nx, ny, nz) = (px + dx, py + dy, pz + dz);
            if in_chunk(nx, ny, nz)
                && chunk.light(nx as u32, ny as u32, nz as u32) < carried
                && registry.is_translucent(chunk.block(nx as u32, ny as u32, nz as u32))
            {
                chunk.set_light(nx as u32, ny as u32, nz as u32, carried);
                queue.push_back((nx, ny, nz, carried));
            }
        }
    }
}

/// Positions with Manhattan distance at most `radius` from the center.
fn diamond(x: i32, y: i32, z: i32, radius: i32) -> Vec<(i32, i32, i32)> {
    let mut positions = Vec::new();
    for dx in -radius..=radius {
        let dy_range = radius - dx.abs();
        for dy in -dy_range..=dy_range {
            let dz_range = radius - dx.abs() - dy.abs();
            for dz in -dz_range..=dz_range {
                positions.push((x + dx, y + dy, z + dz));
            }
        }
    }
    positions
}

/// Positions with Manhattan distance exactly `radius` from the center.
fn diamond_shell(x: i32, y: i32, z: i32, radius: i32) -> Vec<(i32, i32, i32)> {
    let mut positions = Vec::new();
    for dx in -radius..=radius {
        let dy_range = radius - dx.abs();
        for dy in -dy_range..=dy_range {
            let dz_abs = radius - dx.abs() - dy.abs();
            if dz_abs == 0 {
                positions.push((x + dx, y + dy, z + dz_abs));
            } else {
                positions.push((x + dx, y + dy, z + dz_abs));
                positions.push((x + dx, y + dy, z - dz_abs));
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockRegistry};
    use crate::chunk::ChunkRef;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::sync::Arc;
    use strata_common::ChunkPos;

    const STONE: u8 = 1;
    const TORCH: u8 = 2;

    fn test_registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        registry.register(STONE, Block::opaque("stone"));
        registry.register(TORCH, Block::luminous("torch", 12));
        registry
    }

    fn chunk_map() -> HashMap<ChunkPos, ChunkRef> {
        let mut map = HashMap::new();
        for x in -1..=1 {
            for z in -1..=1 {
                let pos = ChunkPos::new(x, 0, z);
                map.insert(pos, Arc::new(RwLock::new(Chunk::new(pos))));
            }
        }
        map
    }

    fn view_over(map: &HashMap<ChunkPos, ChunkRef>) -> WorldView {
        WorldView::local(ChunkPos::new(0, 0, 0), |p| map.get(&p).cloned()).expect("view")
    }

    #[test]
    fn test_sunlight_carries_full_strength_down_a_column() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        // Opaque floor at y = 0.
        view.set_block(8, 0, 8, STONE);
        view.set_sunlight(8, 255, 8, MAX_LIGHT);

        LightPropagator::new(&view, &registry).propagate_sunlight_from(8, 255, 8);

        for y in 1..256 {
            assert_eq!(view.sunlight(8, y, 8), MAX_LIGHT, "column at y={y}");
        }
        // Blocked by the opaque floor.
        assert_eq!(view.sunlight(8, 0, 8), 0);
        // Horizontal neighbors decay by one even at full strength.
        assert_eq!(view.sunlight(7, 255, 8), MAX_LIGHT - 1);
        assert_eq!(view.sunlight(9, 255, 8), MAX_LIGHT - 1);
    }

    #[test]
    fn test_horizontal_decay_across_chunk_boundary() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        view.set_light(15, 10, 8, MAX_LIGHT);

        LightPropagator::new(&view, &registry).propagate_out_of_target_chunk();

        // First voxel inside the +x neighbor chunk.
        assert_eq!(view.light(16, 10, 8), MAX_LIGHT - 1);
        assert_eq!(view.light(17, 10, 8), MAX_LIGHT - 2);
    }

    #[test]
    fn test_sunlight_crosses_boundary_with_decay() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        view.set_sunlight(0, 100, 5, MAX_LIGHT);

        LightPropagator::new(&view, &registry).propagate_out_of_target_chunk();

        assert_eq!(view.sunlight(-1, 100, 5), MAX_LIGHT - 1);
        // The source column carries full strength down, so the neighbor
        // column is fed sideways at every height.
        assert_eq!(view.sunlight(-1, 99, 5), MAX_LIGHT - 1);
    }

    #[test]
    fn test_propagation_is_monotonic_and_bounded() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        view.set_sunlight(15, 128, 15, MAX_LIGHT);
        view.set_light(0, 64, 0, 9);

        let propagator = LightPropagator::new(&view, &registry);
        propagator.propagate_out_of_target_chunk();

        let mut snapshot = Vec::new();
        for x in -16..32 {
            for z in -16..32 {
                for y in 120..136 {
                    snapshot.push(view.sunlight(x, y, z));
                    assert!(view.sunlight(x, y, z) <= MAX_LIGHT);
                }
            }
        }

        // Running the pass again never lowers a value.
        propagator.propagate_out_of_target_chunk();
        let mut index = 0;
        for x in -16..32 {
            for z in -16..32 {
                for y in 120..136 {
                    assert!(view.sunlight(x, y, z) >= snapshot[index]);
                    index += 1;
                }
            }
        }
    }

    #[test]
    fn test_opaque_voxels_block_propagation() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        // Wall of stone between the source and (3, 10, 5).
        view.set_block(4, 10, 5, STONE);
        view.set_light(5, 10, 5, MAX_LIGHT);

        LightPropagator::new(&view, &registry).propagate_light_from(5, 10, 5);

        assert_eq!(view.light(4, 10, 5), 0, "opaque voxel must stay dark");
        // Light routes around the wall instead: 4 steps instead of 2.
        assert_eq!(view.light(3, 10, 5), MAX_LIGHT - 4);
    }

    #[test]
    fn test_sideways_spread_stops_at_level_one() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        view.set_sunlight(8, 10, 8, 1);

        LightPropagator::new(&view, &registry).propagate_sunlight_from(8, 10, 8);

        assert_eq!(view.sunlight(7, 10, 8), 0);
        assert_eq!(view.sunlight(8, 10, 7), 0);
    }

    #[test]
    fn test_internal_lighting_fills_open_chunk() {
        let registry = test_registry();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        // Opaque floor at y = 0, everything else open sky.
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                chunk.set_block(x, 0, z, STONE);
            }
        }

        generate_internal_lighting(&mut chunk, &registry);

        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                for y in 1..CHUNK_SIZE_Y {
                    assert_eq!(chunk.sunlight(x, y, z), MAX_LIGHT);
                }
                assert_eq!(chunk.sunlight(x, 0, z), 0);
            }
        }
    }

    #[test]
    fn test_internal_lighting_under_overhang() {
        let registry = test_registry();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        // A roof over one column: the shadowed voxel is lit from the sides.
        chunk.set_block(8, 100, 8, STONE);

        generate_internal_lighting(&mut chunk, &registry);

        assert_eq!(chunk.sunlight(8, 101, 8), MAX_LIGHT);
        assert_eq!(chunk.sunlight(8, 99, 8), MAX_LIGHT - 1);
        assert_eq!(chunk.sunlight(8, 98, 8), MAX_LIGHT - 1);
    }

    #[test]
    fn test_internal_lighting_spreads_torchlight() {
        let registry = test_registry();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_block(8, 50, 8, TORCH);

        generate_internal_lighting(&mut chunk, &registry);

        assert_eq!(chunk.light(8, 50, 8), 12);
        assert_eq!(chunk.light(8, 53, 8), 9);
        assert_eq!(chunk.light(11, 50, 8), 9);
    }

    #[test]
    fn test_block_change_shadows_column() {
        let map = chunk_map();
        let registry = test_registry();
        {
            // All nine chunks fully internally lit (open sky).
            for chunk in map.values() {
                generate_internal_lighting(&mut chunk.write(), &registry);
            }
        }
        let view = view_over(&map);
        let propagator = LightPropagator::new(&view, &registry);

        view.set_block(8, 100, 8, STONE);
        propagator.update_block_change(8, 100, 8, STONE, 0);

        assert_eq!(view.sunlight(8, 100, 8), 0);
        // The shadowed voxel below is relit from its neighbors, one dimmer.
        assert_eq!(view.sunlight(8, 99, 8), MAX_LIGHT - 1);
        // Removing the block restores the sky column.
        view.set_block(8, 100, 8, 0);
        propagator.update_block_change(8, 100, 8, 0, STONE);
        assert_eq!(view.sunlight(8, 100, 8), MAX_LIGHT);
    }

    #[test]
    fn test_torch_placement_and_removal() {
        let map = chunk_map();
        let view = view_over(&map);
        let registry = test_registry();
        let propagator = LightPropagator::new(&view, &registry);

        view.set_block(8, 50, 8, TORCH);
        propagator.update_block_change(8, 50, 8, TORCH, 0);
        assert_eq!(view.light(8, 50, 8), 12);
        assert_eq!(view.light(8, 50, 11), 9);

        view.set_block(8, 50, 8, 0);
        propagator.update_block_change(8, 50, 8, 0, TORCH);
        assert_eq!(view.light(8, 50, 8), 0);
        assert_eq!(view.light(8, 50, 11), 0);
    }
}
