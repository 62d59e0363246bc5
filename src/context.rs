use crate::movement::events::NotificationSink;
use crate::spatial::grid::{CollisionGrid, TickCache};
use crate::spatial::locks::TileLocks;
use crate::store::{KvStore, StoreError};
use crate::world::actors::{KvPositionStore, PositionStore};
use crate::world::position::WorldBounds;
use crate::world::terrain::TerrainCatalog;
use crate::world::tiles::{KvWorldStore, WorldStore};
use crate::world::time::Clock;
use std::sync::Arc;

/// Handles shared by the executor, lifecycle operations and workers.
#[derive(Clone)]
pub struct WorldContext {
    pub tiles: Arc<dyn WorldStore>,
    pub catalog: Arc<TerrainCatalog>,
    pub locks: TileLocks,
    pub positions: Arc<dyn PositionStore>,
    pub sink: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
    pub bounds: WorldBounds,
}

impl WorldContext {
    /// Builds every store over one shared key-value backend. The world spans
    /// `-world_size..=world_size` on both axes.
    pub fn open(
        store: Arc<dyn KvStore>,
        catalog: Arc<TerrainCatalog>,
        world_size: i32,
        tile_cache_capacity: usize,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let positions = KvPositionStore::new(Arc::clone(&store), world_size)?;
        Ok(Self {
            tiles: Arc::new(KvWorldStore::new(Arc::clone(&store), tile_cache_capacity)),
            catalog,
            locks: TileLocks::new(store),
            positions: Arc::new(positions),
            sink,
            clock,
            bounds: WorldBounds::centered(world_size),
        })
    }

    pub fn build_grid(&self) -> Result<CollisionGrid, StoreError> {
        CollisionGrid::build(self.tiles.as_ref(), &self.catalog, self.bounds)
    }

    pub fn tick_cache(&self, grid: &Arc<CollisionGrid>) -> Result<TickCache, StoreError> {
        TickCache::capture(Arc::clone(grid), &self.locks)
    }
}
