use crate::context::WorldContext;
use crate::movement::events::WorldEvent;
use crate::telemetry::logging;
use crate::world::actors::{ActorId, ActorKind};
use crate::world::position::{Coord, Direction};
use std::sync::Arc;

pub const DEFAULT_MOVE_COOLDOWN_MS: u64 = 1_000;
pub const PENALTY_MOVE_COOLDOWN_MS: u64 = 1_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownActor,
    OnCooldown,
    OutOfBounds,
    MissingTile,
    Impassable,
    Sanctuary,
    /// Reading the actor or the target tile failed.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(Coord),
    Rejected(RejectReason),
    /// The actor stays where it is; a correction was sent to it.
    Corrected(Coord),
}

/// Single-step movement for one actor at a time.
///
/// Every call either commits the whole move (target lock, position record,
/// cooldown, source release) or leaves the world as it found it. The target
/// lock acquire is the only point where concurrent movers are ordered.
#[derive(Clone)]
pub struct MovementExecutor {
    ctx: Arc<WorldContext>,
}

impl MovementExecutor {
    pub fn new(ctx: Arc<WorldContext>) -> Self {
        Self { ctx }
    }

    pub fn process(&self, actor: &ActorId, direction: Direction) -> MoveOutcome {
        let record = match self.ctx.positions.position(actor) {
            Ok(Some(record)) => record,
            Ok(None) => return MoveOutcome::Rejected(RejectReason::UnknownActor),
            Err(err) => {
                logging::log_error(&format!("move {}: position read failed: {}", actor, err));
                return MoveOutcome::Rejected(RejectReason::Unavailable);
            }
        };
        let now = self.ctx.clock.now_millis();
        if !record.is_ready(now) {
            return MoveOutcome::Rejected(RejectReason::OnCooldown);
        }

        let current = record.coord();
        let Some(target) = current
            .step(direction)
            .filter(|target| self.ctx.bounds.contains(*target))
        else {
            return MoveOutcome::Rejected(RejectReason::OutOfBounds);
        };
        let tile = match self.ctx.tiles.tile(target) {
            Ok(Some(tile)) => tile,
            Ok(None) => return MoveOutcome::Rejected(RejectReason::MissingTile),
            Err(err) => {
                logging::log_error(&format!("move {}: tile {} read failed: {}", actor, target, err));
                return MoveOutcome::Rejected(RejectReason::Unavailable);
            }
        };
        let properties = self.ctx.catalog.properties(&tile.terrain);
        if properties.is_some_and(|properties| properties.impassable) {
            return MoveOutcome::Rejected(RejectReason::Impassable);
        }
        if tile.sanctuary && actor.kind() == ActorKind::Npc {
            return MoveOutcome::Rejected(RejectReason::Sanctuary);
        }

        if !tile.sanctuary {
            match self.ctx.locks.acquire(target, actor) {
                Ok(true) => {}
                Ok(false) => return self.correct(actor, current),
                Err(err) => {
                    logging::log_error(&format!("move {}: lock {} failed: {}", actor, target, err));
                    return self.correct(actor, current);
                }
            }
        }

        let cooldown = if properties.is_some_and(|properties| properties.movement_penalty) {
            PENALTY_MOVE_COOLDOWN_MS
        } else {
            record.move_cooldown_ms.unwrap_or(DEFAULT_MOVE_COOLDOWN_MS)
        };
        let mut moved = record;
        moved.x = target.x;
        moved.y = target.y;
        moved.next_action_at = now.saturating_add(cooldown);
        if let Err(err) = self.ctx.positions.set_position(&moved) {
            logging::log_error(&format!(
                "move {}: persist {} -> {} failed, rolling back: {}",
                actor, current, target, err
            ));
            if !tile.sanctuary {
                self.release(target, actor);
            }
            return self.correct(actor, current);
        }

        if !self.on_sanctuary(current) {
            self.release(current, actor);
        }
        self.ctx.sink.publish(WorldEvent::EntityMoved {
            actor: actor.clone(),
            x: target.x,
            y: target.y,
        });
        MoveOutcome::Moved(target)
    }

    fn correct(&self, actor: &ActorId, current: Coord) -> MoveOutcome {
        self.ctx.sink.publish(WorldEvent::StateCorrection {
            actor: actor.clone(),
            x: current.x,
            y: current.y,
        });
        MoveOutcome::Corrected(current)
    }

    fn release(&self, coord: Coord, actor: &ActorId) {
        if let Err(err) = self.ctx.locks.release(coord, actor) {
            logging::log_error(&format!("release {} for {} failed: {}", coord, actor, err));
        }
    }

    /// Unreadable tiles count as ordinary ones; release is owner-checked.
    fn on_sanctuary(&self, coord: Coord) -> bool {
        match self.ctx.tiles.tile(coord) {
            Ok(tile) => tile.is_some_and(|tile| tile.sanctuary),
            Err(err) => {
                logging::log_error(&format!("sanctuary check at {} failed: {}", coord, err));
                false
            }
        }
    }
}
