use crate::store::{KvStore, StoreError};
use crate::world::position::Coord;
use crate::world::terrain::TerrainType;
use crate::world::tile_cache::{CacheStats, TileCache};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

pub const WORLD_TILE_PREFIX: &str = "world:zone:0:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub terrain: TerrainType,
    #[serde(default)]
    pub health: u32,
    /// Never locked on entry; automated actors may not enter.
    #[serde(default, rename = "isSanctuary", skip_serializing_if = "is_false")]
    pub sanctuary: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Tile {
    pub fn new(coord: Coord, terrain: TerrainType) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            terrain,
            health: 0,
            sanctuary: false,
        }
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    pub fn as_sanctuary(mut self) -> Self {
        self.sanctuary = true;
        self
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Authoritative coordinate to tile mapping.
pub trait WorldStore: Send + Sync {
    fn tile(&self, coord: Coord) -> Result<Option<Tile>, StoreError>;

    fn set_tile(&self, tile: &Tile) -> Result<(), StoreError>;

    /// Every stored tile. Used for full snapshots.
    fn tiles(&self) -> Result<Vec<Tile>, StoreError>;

    /// Read cache counters, for stores that cache.
    fn tile_cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

pub fn tile_key(coord: Coord) -> String {
    format!("{}{}", WORLD_TILE_PREFIX, coord.key())
}

/// Tiles stored as JSON values in the shared store, read through an LRU cache.
pub struct KvWorldStore {
    store: Arc<dyn KvStore>,
    cache: Mutex<TileCache>,
}

impl KvWorldStore {
    pub fn new(store: Arc<dyn KvStore>, cache_capacity: usize) -> Self {
        Self {
            store,
            cache: Mutex::new(TileCache::new(cache_capacity)),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache()
            .map(|cache| cache.stats().clone())
            .unwrap_or_default()
    }

    /// Drops a cached entry after an out-of-band write to the shared store.
    pub fn invalidate(&self, coord: Coord) {
        if let Ok(mut cache) = self.cache() {
            cache.invalidate(coord);
        }
    }

    fn cache(&self) -> Result<MutexGuard<'_, TileCache>, StoreError> {
        self.cache
            .lock()
            .map_err(|_| StoreError::Unavailable("tile cache lock poisoned".to_string()))
    }
}

fn decode_tile(key: &str, raw: &str) -> Result<Tile, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Decode(format!("{}: {}", key, err)))
}

impl WorldStore for KvWorldStore {
    fn tile(&self, coord: Coord) -> Result<Option<Tile>, StoreError> {
        // Held across the store read so a concurrent set_tile cannot be
        // overwritten by the value read here.
        let mut cache = self.cache()?;
        if let Some(tile) = cache.get(coord) {
            return Ok(Some(tile));
        }
        let key = tile_key(coord);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        let tile = decode_tile(&key, &raw)?;
        cache.put(tile.clone());
        Ok(Some(tile))
    }

    fn set_tile(&self, tile: &Tile) -> Result<(), StoreError> {
        let raw = serde_json::to_string(tile).map_err(|err| StoreError::Encode(err.to_string()))?;
        let mut cache = self.cache()?;
        match self.store.set(&tile_key(tile.coord()), &raw) {
            Ok(()) => {
                cache.put(tile.clone());
                Ok(())
            }
            Err(err) => {
                cache.invalidate(tile.coord());
                Err(err)
            }
        }
    }

    fn tiles(&self) -> Result<Vec<Tile>, StoreError> {
        self.store
            .scan_prefix(WORLD_TILE_PREFIX)?
            .iter()
            .map(|(key, raw)| decode_tile(key, raw))
            .collect()
    }

    fn tile_cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache_stats())
    }
}
