use crate::store::{KvStore, StoreError};
use crate::telemetry::logging;
use crate::world::actors::ActorId;
use crate::world::position::Coord;
use std::collections::HashSet;
use std::sync::Arc;

pub const LOCK_TILE_PREFIX: &str = "lock:tile:";

pub fn lock_key(coord: Coord) -> String {
    format!("{}{}", LOCK_TILE_PREFIX, coord.key())
}

/// Exclusive per-coordinate ownership records in the shared store.
///
/// First atomic writer wins. There is no waiting, no expiry and no queue: a
/// lock lives until its owner releases it or the store is reset.
#[derive(Clone)]
pub struct TileLocks {
    store: Arc<dyn KvStore>,
}

impl TileLocks {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Claims `coord` for `actor`. False when any owner, `actor` included,
    /// already holds it.
    pub fn acquire(&self, coord: Coord, actor: &ActorId) -> Result<bool, StoreError> {
        self.store.set_if_absent(&lock_key(coord), actor.as_str())
    }

    /// Removes the lock only while `actor` still owns it. A release that
    /// arrives after someone else re-acquired the tile leaves their claim alone.
    pub fn release(&self, coord: Coord, actor: &ActorId) -> Result<bool, StoreError> {
        self.store.delete_if_equals(&lock_key(coord), actor.as_str())
    }

    /// Diagnostic check. Never use it to gate an acquire.
    pub fn is_locked(&self, coord: Coord) -> Result<bool, StoreError> {
        self.store.exists(&lock_key(coord))
    }

    pub fn owner(&self, coord: Coord) -> Result<Option<ActorId>, StoreError> {
        Ok(self.store.get(&lock_key(coord))?.map(ActorId::new))
    }

    /// Point-in-time set of every locked coordinate.
    pub fn locked_coords(&self) -> Result<HashSet<Coord>, StoreError> {
        let mut locked = HashSet::new();
        for (key, _) in self.store.scan_prefix(LOCK_TILE_PREFIX)? {
            match Coord::parse_key(&key[LOCK_TILE_PREFIX.len()..]) {
                Some(coord) => {
                    locked.insert(coord);
                }
                None => logging::log_error(&format!("ignoring malformed lock key {}", key)),
            }
        }
        Ok(locked)
    }
}
