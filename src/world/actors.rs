use crate::store::{KvStore, StoreError};
use crate::world::geo::SpatialIndex;
use crate::world::position::Coord;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub const ACTOR_PREFIX: &str = "actor:";
pub const PLAYER_PREFIX: &str = "player:";
pub const NPC_PREFIX: &str = "npc:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Npc,
    Other,
}

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn player(name: &str) -> Self {
        Self(format!("{}{}", PLAYER_PREFIX, name))
    }

    pub fn npc(name: &str) -> Self {
        Self(format!("{}{}", NPC_PREFIX, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ActorKind {
        if self.0.starts_with(PLAYER_PREFIX) {
            ActorKind::Player
        } else if self.0.starts_with(NPC_PREFIX) {
            ActorKind::Npc
        } else {
            ActorKind::Other
        }
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authoritative position record of one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorPosition {
    pub id: ActorId,
    pub x: i32,
    pub y: i32,
    /// Clock value before which the actor may not act again.
    pub next_action_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_cooldown_ms: Option<u64>,
}

impl ActorPosition {
    pub fn new(id: ActorId, coord: Coord, next_action_at: u64) -> Self {
        Self {
            id,
            x: coord.x,
            y: coord.y,
            next_action_at,
            move_cooldown_ms: None,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    pub fn is_ready(&self, now: u64) -> bool {
        now >= self.next_action_at
    }
}

pub trait PositionStore: Send + Sync {
    fn position(&self, id: &ActorId) -> Result<Option<ActorPosition>, StoreError>;

    /// Persists coordinates, cooldown and index entry as one write.
    fn set_position(&self, record: &ActorPosition) -> Result<(), StoreError>;

    fn remove(&self, id: &ActorId) -> Result<bool, StoreError>;

    /// Actors within `radius` tiles of `center`, nearest first.
    fn actors_near(&self, center: Coord, radius: u32) -> Result<Vec<ActorId>, StoreError>;

    /// Every actor currently in the world, ordered by id.
    fn actors(&self) -> Result<Vec<ActorId>, StoreError>;
}

pub fn actor_key(id: &ActorId) -> String {
    format!("{}{}", ACTOR_PREFIX, id.as_str())
}

/// Position records as JSON in the shared store plus an in-process spatial
/// index rebuilt from the store on construction.
pub struct KvPositionStore {
    store: Arc<dyn KvStore>,
    index: RwLock<SpatialIndex>,
}

impl KvPositionStore {
    pub fn new(store: Arc<dyn KvStore>, world_size: i32) -> Result<Self, StoreError> {
        let mut index = SpatialIndex::new(world_size);
        for (key, raw) in store.scan_prefix(ACTOR_PREFIX)? {
            let record = decode_position(&key, &raw)?;
            index.insert(record.id.as_str(), record.coord());
        }
        Ok(Self {
            store,
            index: RwLock::new(index),
        })
    }

    fn index_poisoned() -> StoreError {
        StoreError::Unavailable("spatial index lock poisoned".to_string())
    }
}

fn decode_position(key: &str, raw: &str) -> Result<ActorPosition, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Decode(format!("{}: {}", key, err)))
}

impl PositionStore for KvPositionStore {
    fn position(&self, id: &ActorId) -> Result<Option<ActorPosition>, StoreError> {
        let key = actor_key(id);
        match self.store.get(&key)? {
            Some(raw) => decode_position(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn set_position(&self, record: &ActorPosition) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(record).map_err(|err| StoreError::Encode(err.to_string()))?;
        let mut index = self.index.write().map_err(|_| Self::index_poisoned())?;
        self.store.set(&actor_key(&record.id), &raw)?;
        index.insert(record.id.as_str(), record.coord());
        Ok(())
    }

    fn remove(&self, id: &ActorId) -> Result<bool, StoreError> {
        let mut index = self.index.write().map_err(|_| Self::index_poisoned())?;
        let removed = self.store.delete(&actor_key(id))?;
        index.remove(id.as_str());
        Ok(removed)
    }

    fn actors_near(&self, center: Coord, radius: u32) -> Result<Vec<ActorId>, StoreError> {
        let index = self.index.read().map_err(|_| Self::index_poisoned())?;
        Ok(index
            .within(center, radius)
            .into_iter()
            .map(|(member, _)| ActorId::new(member))
            .collect())
    }

    fn actors(&self) -> Result<Vec<ActorId>, StoreError> {
        let index = self.index.read().map_err(|_| Self::index_poisoned())?;
        Ok(index.members().map(ActorId::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn actor_kind_comes_from_prefix() {
        assert_eq!(ActorId::player("abc").kind(), ActorKind::Player);
        assert_eq!(ActorId::npc("slime:1").kind(), ActorKind::Npc);
        assert_eq!(ActorId::new("resource:tree").kind(), ActorKind::Other);
        assert_eq!(ActorId::npc("rat:2").as_str(), "npc:rat:2");
    }

    #[test]
    fn position_record_uses_camel_case_json() {
        let store = Arc::new(MemoryStore::new());
        let positions = KvPositionStore::new(store.clone(), 50).expect("positions");
        let mut record = ActorPosition::new(ActorId::player("p1"), Coord::new(3, 4), 1_000);
        record.move_cooldown_ms = Some(100);
        positions.set_position(&record).expect("set");

        let raw = store.get("actor:player:p1").expect("get").expect("raw");
        assert_eq!(
            raw,
            r#"{"id":"player:p1","x":3,"y":4,"nextActionAt":1000,"moveCooldownMs":100}"#
        );
        assert_eq!(
            positions.position(&ActorId::player("p1")).expect("position"),
            Some(record)
        );
    }

    #[test]
    fn index_follows_moves_and_removal() {
        let store = Arc::new(MemoryStore::new());
        let positions = KvPositionStore::new(store, 50).expect("positions");
        let npc = ActorId::npc("1");
        positions
            .set_position(&ActorPosition::new(npc.clone(), Coord::new(0, 0), 0))
            .expect("set");
        assert_eq!(positions.actors_near(Coord::new(1, 0), 2).expect("near"), vec![npc.clone()]);

        positions
            .set_position(&ActorPosition::new(npc.clone(), Coord::new(30, 30), 0))
            .expect("move");
        assert!(positions.actors_near(Coord::new(1, 0), 2).expect("near").is_empty());

        assert!(positions.remove(&npc).expect("remove"));
        assert!(positions.actors().expect("actors").is_empty());
        assert_eq!(positions.position(&npc).expect("position"), None);
        assert!(!positions.remove(&npc).expect("remove again"));
    }

    #[test]
    fn index_is_rebuilt_from_store() {
        let store = Arc::new(MemoryStore::new());
        {
            let positions = KvPositionStore::new(store.clone(), 50).expect("positions");
            positions
                .set_position(&ActorPosition::new(ActorId::npc("b"), Coord::new(2, 0), 0))
                .expect("set");
            positions
                .set_position(&ActorPosition::new(ActorId::npc("a"), Coord::new(1, 0), 0))
                .expect("set");
        }
        let reopened = KvPositionStore::new(store, 50).expect("reopen");
        assert_eq!(
            reopened.actors().expect("actors"),
            vec![ActorId::npc("a"), ActorId::npc("b")]
        );
        assert_eq!(
            reopened.actors_near(Coord::new(0, 0), 1).expect("near"),
            vec![ActorId::npc("a")]
        );
    }

    #[test]
    fn readiness_compares_against_next_action() {
        let record = ActorPosition::new(ActorId::npc("x"), Coord::new(0, 0), 500);
        assert!(!record.is_ready(499));
        assert!(record.is_ready(500));
    }

    #[test]
    fn poisoned_index_leaves_the_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let positions = Arc::new(KvPositionStore::new(store.clone(), 50).expect("positions"));
        let npc = ActorId::npc("1");
        positions
            .set_position(&ActorPosition::new(npc.clone(), Coord::new(0, 0), 0))
            .expect("set");

        let holder = Arc::clone(&positions);
        let poisoned = std::thread::spawn(move || {
            let _guard = holder.index.write().expect("index");
            panic!("index holder died");
        })
        .join();
        assert!(poisoned.is_err());

        let err = positions
            .set_position(&ActorPosition::new(npc.clone(), Coord::new(1, 0), 0))
            .expect_err("poisoned index");
        assert!(matches!(err, StoreError::Unavailable(_)));
        let raw = store.get("actor:npc:1").expect("get").expect("raw");
        assert!(raw.contains(r#""x":0"#));

        assert!(positions.remove(&npc).is_err());
        assert!(store.exists("actor:npc:1").expect("exists"));
    }
}
