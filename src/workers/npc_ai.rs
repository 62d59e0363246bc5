use crate::context::WorldContext;
use crate::movement::executor::{MoveOutcome, MovementExecutor};
use crate::store::StoreError;
use crate::telemetry::logging;
use crate::world::actors::{ActorKind, ActorPosition};
use crate::world::position::{Coord, Direction, WorldBounds};
use std::sync::Arc;

pub const AI_TICK_MS: u64 = 750;
pub const AGGRO_RADIUS: u32 = 5;
pub const WANDER_PERCENT: u32 = 40;

/// Small deterministic generator for wander rolls.
#[derive(Debug, Clone)]
pub struct WalkRng {
    state: u64,
}

impl WalkRng {
    pub fn from_seed(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    pub fn roll_percent(&mut self, chance: u32) -> bool {
        self.next_u32() % 100 < chance.min(100)
    }

    pub fn roll_direction(&mut self) -> Direction {
        Direction::ALL[(self.next_u32() % Direction::ALL.len() as u32) as usize]
    }

    /// Uniform-ish value in `min..=max`.
    pub fn roll_range(&mut self, min: i32, max: i32) -> i32 {
        let (min, max) = if min >= max { (min, min) } else { (min, max) };
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        let value = u64::from(self.next_u32()) % span;
        (i64::from(min) + value as i64) as i32
    }

    pub fn roll_coord(&mut self, bounds: WorldBounds) -> Coord {
        Coord::new(
            self.roll_range(bounds.min.x, bounds.max.x),
            self.roll_range(bounds.min.y, bounds.max.y),
        )
    }
}

/// Step that closes the larger axis gap first. Equal gaps move vertically.
pub fn chase_direction(from: Coord, to: Coord) -> Option<Direction> {
    if from == to {
        return None;
    }
    let dx = i64::from(to.x) - i64::from(from.x);
    let dy = i64::from(to.y) - i64::from(from.y);
    let direction = if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    };
    Some(direction)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcTickReport {
    pub considered: usize,
    pub moved: usize,
    pub rejected: usize,
    pub corrected: usize,
    pub idle: usize,
}

/// Drives every `npc:` actor: chase the nearest player in range, otherwise
/// wander now and then. Moves go through the ordinary executor.
pub struct NpcBrain {
    ctx: Arc<WorldContext>,
    executor: MovementExecutor,
    rng: WalkRng,
}

impl NpcBrain {
    pub fn new(ctx: Arc<WorldContext>, seed: u64) -> Self {
        Self {
            executor: MovementExecutor::new(Arc::clone(&ctx)),
            ctx,
            rng: WalkRng::from_seed(seed),
        }
    }

    pub fn tick(&mut self) -> NpcTickReport {
        let mut report = NpcTickReport::default();
        let actors = match self.ctx.positions.actors() {
            Ok(actors) => actors,
            Err(err) => {
                logging::log_error(&format!("npc tick: actor listing failed: {}", err));
                return report;
            }
        };
        let now = self.ctx.clock.now_millis();

        for npc in actors.iter().filter(|actor| actor.kind() == ActorKind::Npc) {
            let record = match self.ctx.positions.position(npc) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    logging::log_error(&format!("npc tick: {} unreadable: {}", npc, err));
                    continue;
                }
            };
            if !record.is_ready(now) {
                continue;
            }
            report.considered += 1;

            let direction = match self.decide(&record) {
                Ok(direction) => direction,
                Err(err) => {
                    logging::log_error(&format!("npc tick: {} decision failed: {}", npc, err));
                    continue;
                }
            };
            let Some(direction) = direction else {
                report.idle += 1;
                continue;
            };
            match self.executor.process(npc, direction) {
                MoveOutcome::Moved(_) => report.moved += 1,
                MoveOutcome::Rejected(_) => report.rejected += 1,
                MoveOutcome::Corrected(_) => report.corrected += 1,
            }
        }
        report
    }

    fn decide(&mut self, npc: &ActorPosition) -> Result<Option<Direction>, StoreError> {
        if let Some(target) = self.nearest_player(npc.coord())? {
            if npc.coord().is_adjacent(target) {
                return Ok(None);
            }
            return Ok(chase_direction(npc.coord(), target));
        }
        if self.rng.roll_percent(WANDER_PERCENT) {
            return Ok(Some(self.rng.roll_direction()));
        }
        Ok(None)
    }

    fn nearest_player(&self, around: Coord) -> Result<Option<Coord>, StoreError> {
        for actor in self.ctx.positions.actors_near(around, AGGRO_RADIUS)? {
            if actor.kind() != ActorKind::Player {
                continue;
            }
            if let Some(record) = self.ctx.positions.position(&actor)? {
                return Ok(Some(record.coord()));
            }
        }
        Ok(None)
    }
}
