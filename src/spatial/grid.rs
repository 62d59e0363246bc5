use crate::spatial::locks::TileLocks;
use crate::store::StoreError;
use crate::telemetry::logging;
use crate::world::position::{Coord, WorldBounds};
use crate::world::terrain::TerrainCatalog;
use crate::world::tiles::WorldStore;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Snapshot of blocked coordinates: impassable terrain plus in-bounds
/// coordinates with no tile at all.
///
/// Built wholesale from the world store and never updated in place: when
/// tiles change, callers build a new grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionGrid {
    bounds: WorldBounds,
    impassable: HashSet<Coord>,
    missing: HashSet<Coord>,
}

impl CollisionGrid {
    pub fn build(
        world: &dyn WorldStore,
        catalog: &TerrainCatalog,
        bounds: WorldBounds,
    ) -> Result<Self, StoreError> {
        let mut impassable = HashSet::new();
        let mut present = HashSet::new();
        let mut unknown = BTreeSet::new();
        for tile in world.tiles()? {
            present.insert(tile.coord());
            match catalog.properties(&tile.terrain) {
                Some(properties) if properties.impassable => {
                    impassable.insert(tile.coord());
                }
                Some(_) => {}
                None => {
                    unknown.insert(tile.terrain.to_string());
                }
            }
        }
        if !unknown.is_empty() {
            logging::log_error(&format!(
                "collision grid: unknown terrain treated as passable: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
        let missing: HashSet<Coord> = bounds
            .coords()
            .filter(|coord| !present.contains(coord))
            .collect();
        logging::log_game(&format!(
            "collision grid built with {} impassable tiles, {} missing",
            impassable.len(),
            missing.len()
        ));
        Ok(Self {
            bounds,
            impassable,
            missing,
        })
    }

    pub fn from_impassable(bounds: WorldBounds, impassable: impl IntoIterator<Item = Coord>) -> Self {
        Self {
            bounds,
            impassable: impassable.into_iter().collect(),
            missing: HashSet::new(),
        }
    }

    /// Marks `missing` as coordinates without a tile.
    pub fn with_missing(mut self, missing: impl IntoIterator<Item = Coord>) -> Self {
        self.missing.extend(missing);
        self
    }

    pub fn open(bounds: WorldBounds) -> Self {
        Self::from_impassable(bounds, [])
    }

    pub fn is_impassable(&self, coord: Coord) -> bool {
        self.impassable.contains(&coord)
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn is_missing(&self, coord: Coord) -> bool {
        self.missing.contains(&coord)
    }

    /// Impassable terrain or no tile.
    pub fn is_blocked(&self, coord: Coord) -> bool {
        self.is_impassable(coord) || self.is_missing(coord)
    }

    pub fn impassable_count(&self) -> usize {
        self.impassable.len()
    }

    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }
}

/// Collision and lock state frozen for one planning call.
#[derive(Debug, Clone)]
pub struct TickCache {
    grid: Arc<CollisionGrid>,
    locked: HashSet<Coord>,
}

impl TickCache {
    pub fn new(grid: Arc<CollisionGrid>, locked: HashSet<Coord>) -> Self {
        Self { grid, locked }
    }

    /// Pairs `grid` with the locks held right now.
    pub fn capture(grid: Arc<CollisionGrid>, locks: &TileLocks) -> Result<Self, StoreError> {
        Ok(Self::new(grid, locks.locked_coords()?))
    }

    pub fn bounds(&self) -> WorldBounds {
        self.grid.bounds()
    }

    pub fn is_locked(&self, coord: Coord) -> bool {
        self.locked.contains(&coord)
    }

    pub fn is_blocked(&self, coord: Coord) -> bool {
        self.grid.is_blocked(coord)
    }

    /// In bounds, unlocked, with a passable tile.
    pub fn is_walkable(&self, coord: Coord) -> bool {
        self.bounds().contains(coord) && !self.is_locked(coord) && !self.is_blocked(coord)
    }

    pub fn grid(&self) -> &Arc<CollisionGrid> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::world::actors::ActorId;
    use crate::world::terrain::TerrainType;
    use crate::world::tiles::{KvWorldStore, Tile};

    #[test]
    fn build_marks_only_impassable_terrain() {
        let world = KvWorldStore::new(Arc::new(MemoryStore::new()), 8);
        let catalog = TerrainCatalog::builtin();
        for (x, terrain) in [
            (0, TerrainType::GROUND),
            (1, TerrainType::TREE),
            (2, TerrainType::WATER),
            (3, TerrainType::WOODEN_WALL),
            (4, "lava"),
        ] {
            world
                .set_tile(&Tile::new(Coord::new(x, 0), TerrainType::new(terrain)))
                .expect("set");
        }

        let bounds = WorldBounds::new(Coord::new(0, 0), Coord::new(4, 0));
        let grid = CollisionGrid::build(&world, &catalog, bounds).expect("build");
        assert_eq!(grid.impassable_count(), 2);
        assert_eq!(grid.missing_count(), 0);
        assert!(grid.is_impassable(Coord::new(1, 0)));
        assert!(grid.is_impassable(Coord::new(3, 0)));
        assert!(!grid.is_impassable(Coord::new(2, 0)));
        assert!(!grid.is_impassable(Coord::new(4, 0)));
    }

    #[test]
    fn grid_is_a_snapshot() {
        let world = KvWorldStore::new(Arc::new(MemoryStore::new()), 8);
        let catalog = TerrainCatalog::builtin();
        let coord = Coord::new(0, 0);
        world
            .set_tile(&Tile::new(coord, TerrainType::ground()))
            .expect("set");
        let before = CollisionGrid::build(&world, &catalog, WorldBounds::centered(2)).expect("build");

        world
            .set_tile(&Tile::new(coord, TerrainType::new(TerrainType::WOODEN_WALL)).with_health(10))
            .expect("wall");
        assert!(!before.is_impassable(coord));

        let after = CollisionGrid::build(&world, &catalog, WorldBounds::centered(2)).expect("rebuild");
        assert!(after.is_impassable(coord));
    }

    #[test]
    fn tick_cache_freezes_lock_state() {
        let locks = TileLocks::new(Arc::new(MemoryStore::new()));
        let grid = Arc::new(CollisionGrid::from_impassable(
            WorldBounds::centered(3),
            [Coord::new(1, 1)],
        ));
        locks.acquire(Coord::new(0, 1), &ActorId::npc("1")).expect("lock");

        let cache = TickCache::capture(Arc::clone(&grid), &locks).expect("capture");
        locks.acquire(Coord::new(2, 2), &ActorId::npc("2")).expect("later lock");

        assert!(cache.is_locked(Coord::new(0, 1)));
        assert!(!cache.is_locked(Coord::new(2, 2)));
        assert!(!cache.is_walkable(Coord::new(0, 1)));
        assert!(!cache.is_walkable(Coord::new(1, 1)));
        assert!(!cache.is_walkable(Coord::new(4, 0)));
        assert!(cache.is_walkable(Coord::new(2, 2)));
    }

    #[test]
    fn coordinates_without_tiles_are_blocked() {
        let world = KvWorldStore::new(Arc::new(MemoryStore::new()), 8);
        let catalog = TerrainCatalog::builtin();
        world
            .set_tile(&Tile::new(Coord::new(0, 0), TerrainType::ground()))
            .expect("set");
        let bounds = WorldBounds::new(Coord::new(0, 0), Coord::new(1, 0));

        let grid = Arc::new(CollisionGrid::build(&world, &catalog, bounds).expect("build"));
        assert_eq!(grid.missing_count(), 1);
        assert!(grid.is_missing(Coord::new(1, 0)));
        assert!(!grid.is_impassable(Coord::new(1, 0)));
        assert!(grid.is_blocked(Coord::new(1, 0)));

        let cache = TickCache::new(grid, HashSet::new());
        assert!(cache.is_walkable(Coord::new(0, 0)));
        assert!(!cache.is_walkable(Coord::new(1, 0)));
    }
}
