use crate::context::WorldContext;
use crate::movement::events::WorldEvent;
use crate::spatial::grid::TickCache;
use crate::store::StoreError;
use crate::telemetry::logging;
use crate::world::actors::{ActorId, ActorKind, ActorPosition};
use crate::world::position::Coord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    AlreadyPresent,
    OutOfBounds,
    MissingTile,
    Impassable,
    Sanctuary,
    /// Spawn tile locked by someone else. Pick another spawn and retry.
    Occupied,
    Store(StoreError),
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::AlreadyPresent => write!(f, "actor is already in the world"),
            JoinError::OutOfBounds => write!(f, "spawn lies outside the world"),
            JoinError::MissingTile => write!(f, "spawn has no tile"),
            JoinError::Impassable => write!(f, "spawn terrain is impassable"),
            JoinError::Sanctuary => write!(f, "automated actors may not spawn in a sanctuary"),
            JoinError::Occupied => write!(f, "spawn tile is occupied"),
            JoinError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<StoreError> for JoinError {
    fn from(err: StoreError) -> Self {
        JoinError::Store(err)
    }
}

/// Places `actor` on `spawn`: locks the tile, writes the position record and
/// announces the arrival. No retry on contention.
pub fn join(
    ctx: &WorldContext,
    actor: &ActorId,
    spawn: Coord,
    move_cooldown_ms: Option<u64>,
) -> Result<ActorPosition, JoinError> {
    if ctx.positions.position(actor)?.is_some() {
        return Err(JoinError::AlreadyPresent);
    }
    if !ctx.bounds.contains(spawn) {
        return Err(JoinError::OutOfBounds);
    }
    let tile = ctx.tiles.tile(spawn)?.ok_or(JoinError::MissingTile)?;
    if ctx.catalog.is_impassable(&tile.terrain) {
        return Err(JoinError::Impassable);
    }
    if tile.sanctuary && actor.kind() == ActorKind::Npc {
        return Err(JoinError::Sanctuary);
    }
    if !tile.sanctuary && !ctx.locks.acquire(spawn, actor)? {
        return Err(JoinError::Occupied);
    }

    let mut record = ActorPosition::new(actor.clone(), spawn, ctx.clock.now_millis());
    record.move_cooldown_ms = move_cooldown_ms;
    if let Err(err) = ctx.positions.set_position(&record) {
        if !tile.sanctuary {
            if let Err(release_err) = ctx.locks.release(spawn, actor) {
                logging::log_error(&format!(
                    "join {}: spawn lock {} left behind: {}",
                    actor, spawn, release_err
                ));
            }
        }
        return Err(err.into());
    }

    logging::log_game(&format!("{} joined at {}", actor, spawn));
    ctx.sink.publish(WorldEvent::EntityJoined {
        actor: actor.clone(),
        x: spawn.x,
        y: spawn.y,
    });
    Ok(record)
}

/// Removes `actor` from the world. False when it was not present.
pub fn leave(ctx: &WorldContext, actor: &ActorId) -> Result<bool, StoreError> {
    let Some(record) = ctx.positions.position(actor)? else {
        return Ok(false);
    };
    ctx.locks.release(record.coord(), actor)?;
    ctx.positions.remove(actor)?;

    logging::log_game(&format!("{} left from {}", actor, record.coord()));
    ctx.sink.publish(WorldEvent::EntityLeft {
        actor: actor.clone(),
    });
    Ok(true)
}

/// Coordinates at exactly Manhattan distance `radius` from `center`, top row
/// first and left before right within a row.
pub fn ring(center: Coord, radius: u32) -> Vec<Coord> {
    let radius = radius.min(i32::MAX as u32) as i32;
    if radius == 0 {
        return vec![center];
    }
    let mut coords = Vec::with_capacity(4 * radius as usize);
    for dy in -radius..=radius {
        let dx = radius - dy.abs();
        let row = center.y.checked_add(dy);
        let left = center.x.checked_sub(dx);
        let right = center.x.checked_add(dx);
        if let (Some(y), Some(x)) = (row, left) {
            coords.push(Coord::new(x, y));
        }
        if dx != 0 {
            if let (Some(y), Some(x)) = (row, right) {
                coords.push(Coord::new(x, y));
            }
        }
    }
    coords
}

/// Closest walkable coordinate to `around` within `max_radius`, searching
/// outward ring by ring.
pub fn nearest_free_tile(cache: &TickCache, around: Coord, max_radius: u32) -> Option<Coord> {
    (0..=max_radius)
        .flat_map(|radius| ring(around, radius))
        .find(|coord| cache.is_walkable(*coord))
}
