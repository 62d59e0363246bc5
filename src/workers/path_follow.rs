use crate::context::WorldContext;
use crate::movement::executor::{MoveOutcome, MovementExecutor, RejectReason};
use crate::spatial::grid::{CollisionGrid, TickCache};
use crate::spatial::pathfinding::{find_path, find_path_to_adjacent};
use crate::store::StoreError;
use crate::telemetry::logging;
use crate::world::actors::ActorId;
use crate::world::position::Coord;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

pub const DEFAULT_GRID_REFRESH_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Stand on any tile next to the coordinate.
    NextTo(Coord),
    /// Stand on the coordinate itself.
    Onto(Coord),
}

impl Goal {
    fn reached(self, at: Coord) -> bool {
        match self {
            Goal::NextTo(target) => at.is_adjacent(target),
            Goal::Onto(target) => at == target,
        }
    }

    fn plan(self, from: Coord, cache: &TickCache) -> Option<Vec<Coord>> {
        match self {
            Goal::NextTo(target) => find_path_to_adjacent(from, target, cache),
            Goal::Onto(target) => find_path(from, target, cache),
        }
    }
}

#[derive(Debug)]
struct Route {
    goal: Goal,
    /// Steps still to take, current position excluded.
    steps: VecDeque<Coord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowReport {
    pub stepped: usize,
    pub replanned: usize,
    pub corrected: usize,
    pub arrived: usize,
    pub abandoned: usize,
}

/// Walks actors toward assigned goals one executor step per tick.
///
/// Plans are advisory. A refused step drops the remaining route and the
/// actor replans next tick against fresh locks. The collision grid is
/// rebuilt once it is older than the refresh interval.
pub struct PathFollower {
    ctx: Arc<WorldContext>,
    executor: MovementExecutor,
    routes: BTreeMap<ActorId, Route>,
    grid: Arc<CollisionGrid>,
    grid_built_at: u64,
    refresh_ms: u64,
}

impl PathFollower {
    pub fn new(ctx: Arc<WorldContext>, refresh_ms: u64) -> Result<Self, StoreError> {
        let grid = Arc::new(ctx.build_grid()?);
        Ok(Self {
            executor: MovementExecutor::new(Arc::clone(&ctx)),
            grid_built_at: ctx.clock.now_millis(),
            ctx,
            routes: BTreeMap::new(),
            grid,
            refresh_ms,
        })
    }

    /// Replaces any goal `actor` already had.
    pub fn assign(&mut self, actor: ActorId, goal: Goal) {
        logging::log_game(&format!("{} heading for {:?}", actor, goal));
        self.routes.insert(
            actor,
            Route {
                goal,
                steps: VecDeque::new(),
            },
        );
    }

    pub fn cancel(&mut self, actor: &ActorId) -> bool {
        self.routes.remove(actor).is_some()
    }

    pub fn is_following(&self, actor: &ActorId) -> bool {
        self.routes.contains_key(actor)
    }

    pub fn refresh_grid(&mut self) -> Result<(), StoreError> {
        self.grid = Arc::new(self.ctx.build_grid()?);
        self.grid_built_at = self.ctx.clock.now_millis();
        Ok(())
    }

    pub fn tick(&mut self) -> FollowReport {
        let mut report = FollowReport::default();
        let now = self.ctx.clock.now_millis();
        if now.saturating_sub(self.grid_built_at) >= self.refresh_ms {
            if let Err(err) = self.refresh_grid() {
                logging::log_error(&format!("path follow: grid rebuild failed: {}", err));
            }
        }

        let mut cache: Option<TickCache> = None;
        let actors: Vec<ActorId> = self.routes.keys().cloned().collect();
        for actor in actors {
            let record = match self.ctx.positions.position(&actor) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.routes.remove(&actor);
                    report.abandoned += 1;
                    continue;
                }
                Err(err) => {
                    logging::log_error(&format!("path follow: {} unreadable: {}", actor, err));
                    continue;
                }
            };
            if !record.is_ready(now) {
                continue;
            }
            let current = record.coord();
            let Some(route) = self.routes.get_mut(&actor) else {
                continue;
            };
            if route.goal.reached(current) {
                self.routes.remove(&actor);
                report.arrived += 1;
                continue;
            }

            let on_track = route
                .steps
                .front()
                .is_some_and(|next| current.is_adjacent(*next));
            if !on_track {
                if cache.is_none() {
                    match self.ctx.tick_cache(&self.grid) {
                        Ok(fresh) => cache = Some(fresh),
                        Err(err) => {
                            logging::log_error(&format!("path follow: lock snapshot failed: {}", err));
                            return report;
                        }
                    }
                }
                let Some(path) = cache.as_ref().and_then(|cache| route.goal.plan(current, cache)) else {
                    logging::log_game(&format!("{} has no route to {:?}", actor, route.goal));
                    self.routes.remove(&actor);
                    report.abandoned += 1;
                    continue;
                };
                route.steps = path.into_iter().skip(1).collect();
                report.replanned += 1;
            }

            let Some(next) = route.steps.front().copied() else {
                continue;
            };
            let Some(direction) = current.direction_to(next) else {
                route.steps.clear();
                continue;
            };
            match self.executor.process(&actor, direction) {
                MoveOutcome::Moved(at) => {
                    route.steps.pop_front();
                    report.stepped += 1;
                    if route.goal.reached(at) {
                        self.routes.remove(&actor);
                        report.arrived += 1;
                    }
                }
                MoveOutcome::Corrected(_) => {
                    route.steps.clear();
                    report.corrected += 1;
                }
                MoveOutcome::Rejected(RejectReason::OnCooldown) => {}
                MoveOutcome::Rejected(reason) => {
                    logging::log_game(&format!("{} step to {} refused: {:?}", actor, next, reason));
                    route.steps.clear();
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::TestWorld;
    use crate::movement::executor::DEFAULT_MOVE_COOLDOWN_MS;
    use crate::movement::lifecycle::join;
    use crate::world::terrain::TerrainType;

    fn position(world: &TestWorld, actor: &ActorId) -> Coord {
        world
            .ctx
            .positions
            .position(actor)
            .expect("read")
            .expect("present")
            .coord()
    }

    fn run(world: &TestWorld, follower: &mut PathFollower, ticks: usize) -> Vec<FollowReport> {
        (0..ticks)
            .map(|_| {
                let report = follower.tick();
                world.clock.advance(DEFAULT_MOVE_COOLDOWN_MS);
                report
            })
            .collect()
    }

    #[test]
    fn walks_next_to_target_then_stops() {
        let world = TestWorld::flat(5);
        let player = ActorId::player("p");
        join(&world.ctx, &player, Coord::new(0, 0), None).expect("join");
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_GRID_REFRESH_MS).expect("follower");
        follower.assign(player.clone(), Goal::NextTo(Coord::new(3, 0)));

        let reports = run(&world, &mut follower, 3);
        assert_eq!(reports[0].replanned, 1);
        assert_eq!(reports[0].stepped, 1);
        assert_eq!(reports[1].stepped, 1);
        assert_eq!(reports[1].arrived, 1);
        assert_eq!(position(&world, &player), Coord::new(2, 0));
        assert!(!follower.is_following(&player));
        assert_eq!(reports[2], FollowReport::default());
    }

    #[test]
    fn corrected_step_triggers_a_replan_around_the_blocker() {
        let world = TestWorld::flat(5);
        let player = ActorId::player("p");
        join(&world.ctx, &player, Coord::new(0, 0), None).expect("join");
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_GRID_REFRESH_MS).expect("follower");
        follower.assign(player.clone(), Goal::NextTo(Coord::new(3, 0)));

        run(&world, &mut follower, 1);
        assert_eq!(position(&world, &player), Coord::new(1, 0));
        let blocker = ActorId::npc("blocker");
        join(&world.ctx, &blocker, Coord::new(2, 0), None).expect("blocker");

        let reports = run(&world, &mut follower, 6);
        assert_eq!(reports[0].corrected, 1);
        assert_eq!(reports[1].replanned, 1);
        assert!(!follower.is_following(&player));
        let end = position(&world, &player);
        assert!(end.is_adjacent(Coord::new(3, 0)));
        assert_ne!(end, Coord::new(2, 0));
        assert_eq!(position(&world, &blocker), Coord::new(2, 0));
    }

    #[test]
    fn unreachable_goal_is_abandoned() {
        let world = TestWorld::flat(5);
        for coord in [(3, -1), (3, 1), (2, 0), (4, 0)] {
            world.set_terrain(Coord::new(coord.0, coord.1), TerrainType::ROCK);
        }
        let player = ActorId::player("p");
        join(&world.ctx, &player, Coord::new(0, 0), None).expect("join");
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_GRID_REFRESH_MS).expect("follower");
        follower.assign(player.clone(), Goal::NextTo(Coord::new(3, 0)));

        let report = follower.tick();
        assert_eq!(report.abandoned, 1);
        assert!(!follower.is_following(&player));
        assert_eq!(position(&world, &player), Coord::new(0, 0));
    }

    #[test]
    fn stale_grid_is_refreshed_after_interval() {
        let world = TestWorld::flat(5);
        let player = ActorId::player("p");
        join(&world.ctx, &player, Coord::new(0, 0), None).expect("join");
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_MOVE_COOLDOWN_MS).expect("follower");
        world.set_terrain(Coord::new(1, 0), TerrainType::TREE);
        follower.assign(player.clone(), Goal::Onto(Coord::new(2, 0)));

        let first = follower.tick();
        assert_eq!(first.stepped, 0);
        assert_eq!(position(&world, &player), Coord::new(0, 0));

        world.clock.advance(DEFAULT_MOVE_COOLDOWN_MS);
        let mut visited = Vec::new();
        for _ in 0..6 {
            follower.tick();
            visited.push(position(&world, &player));
            world.clock.advance(DEFAULT_MOVE_COOLDOWN_MS);
        }
        assert!(!visited.contains(&Coord::new(1, 0)));
        assert_eq!(position(&world, &player), Coord::new(2, 0));
        assert!(!follower.is_following(&player));
    }

    #[test]
    fn departed_actor_drops_its_route() {
        let world = TestWorld::flat(3);
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_GRID_REFRESH_MS).expect("follower");
        let ghost = ActorId::player("ghost");
        follower.assign(ghost.clone(), Goal::Onto(Coord::new(1, 1)));
        assert_eq!(follower.tick().abandoned, 1);
        assert!(!follower.cancel(&ghost));
    }

    #[test]
    fn routes_around_a_coordinate_without_a_tile() {
        let world = TestWorld::flat(5);
        world.remove_tile(Coord::new(1, 0));
        let player = ActorId::player("p");
        join(&world.ctx, &player, Coord::new(0, 0), None).expect("join");
        let mut follower =
            PathFollower::new(Arc::clone(&world.ctx), DEFAULT_GRID_REFRESH_MS).expect("follower");
        follower.assign(player.clone(), Goal::Onto(Coord::new(2, 0)));

        let mut visited = Vec::new();
        let mut replans = 0;
        for _ in 0..6 {
            replans += follower.tick().replanned;
            visited.push(position(&world, &player));
            world.clock.advance(DEFAULT_MOVE_COOLDOWN_MS);
        }
        assert_eq!(replans, 1);
        assert!(!visited.contains(&Coord::new(1, 0)));
        assert_eq!(position(&world, &player), Coord::new(2, 0));
        assert!(!follower.is_following(&player));
    }
}
