use crate::world::position::Coord;
use crate::world::tiles::Tile;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub inserts: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

/// Decoded tiles with LRU eviction, keyed by coordinate.
///
/// Process-local: writes made through another process are only seen once the
/// entry is evicted or invalidated.
pub struct TileCache {
    cache: LruCache<Coord, Tile>,
    stats: CacheStats,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        TileCache {
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Cached tile, counting the lookup as a hit or a miss.
    pub fn get(&mut self, coord: Coord) -> Option<Tile> {
        match self.cache.get(&coord) {
            Some(tile) => {
                self.stats.hits += 1;
                Some(tile.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, tile: Tile) {
        let coord = tile.coord();
        self.stats.inserts += 1;
        if let Some((displaced, _)) = self.cache.push(coord, tile) {
            if displaced != coord {
                self.stats.evictions += 1;
            }
        }
    }

    pub fn invalidate(&mut self, coord: Coord) {
        self.cache.pop(&coord);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
