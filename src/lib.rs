pub mod config;
pub mod context;
pub mod movement;
pub mod spatial;
pub mod store;
pub mod telemetry;
pub mod workers;
pub mod world;

pub use context::WorldContext;
pub use movement::{MoveOutcome, MovementExecutor, NotificationSink, RejectReason, WorldEvent};
pub use spatial::{find_path, find_path_to_adjacent, CollisionGrid, TickCache, TileLocks};
pub use store::{KvStore, MemoryStore, StoreError};
pub use world::actors::{ActorId, ActorPosition, PositionStore};
pub use world::position::{Coord, Direction, WorldBounds};

use movement::lifecycle::{self, nearest_free_tile};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use telemetry::logging;
use workers::npc_ai::WalkRng;
use workers::path_follow::Goal;
use workers::{spawn_periodic, NpcBrain, PathFollower, WorkerControl};
use world::loader;
use world::terrain::TerrainCatalog;
use world::time::MonotonicClock;

const SPAWN_SEARCH_RADIUS: u32 = 5;

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    logging::init(&config.root)?;

    let catalog = Arc::new(TerrainCatalog::load_or_builtin(&config.root)?);
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let ctx = Arc::new(
        WorldContext::open(
            store,
            Arc::clone(&catalog),
            config.world_size,
            config.tile_cache,
            Arc::new(movement::LogSink),
            Arc::new(MonotonicClock::new()),
        )
        .map_err(|err| format!("world context: {}", err))?,
    );

    let tiles = loader::load_or_flat(&config.root, ctx.bounds, &catalog)?;
    let seeded = loader::seed(ctx.tiles.as_ref(), &tiles)
        .map_err(|err| format!("world seed failed: {}", err))?;
    let grid = Arc::new(
        ctx.build_grid()
            .map_err(|err| format!("collision grid: {}", err))?,
    );
    logging::log_game(&format!(
        "world ready: {} tiles, {} terrain types, {} impassable",
        seeded,
        catalog.len(),
        grid.impassable_count()
    ));
    println!("tileworld: world");
    println!("- root: {}", config.root.display());
    println!(
        "- bounds: ({},{}) -> ({},{})",
        ctx.bounds.min.x, ctx.bounds.min.y, ctx.bounds.max.x, ctx.bounds.max.y
    );
    println!("- tiles: {}", seeded);
    println!("- impassable: {}", grid.impassable_count());
    println!("- missing: {}", grid.missing_count());

    let mut rng = WalkRng::from_seed(time_seed());
    let npcs: Vec<ActorId> = (0..config.npc_count)
        .map(|index| ActorId::npc(&format!("wanderer:{}", index)))
        .collect();
    let echoes: Vec<ActorId> = (0..config.echo_count)
        .map(|index| ActorId::player(&format!("echo:{}", index)))
        .collect();
    let mut present = Vec::new();
    for actor in npcs.iter().chain(echoes.iter()) {
        if spawn(&ctx, &grid, &mut rng, actor) {
            present.push(actor.clone());
        }
    }
    println!("- actors: {} of {}", present.len(), npcs.len() + echoes.len());

    let control = Arc::new(WorkerControl::new());
    let mut brain = NpcBrain::new(Arc::clone(&ctx), time_seed());
    let ai_handle = spawn_periodic(
        "npc-ai",
        Duration::from_millis(config.ai_tick_ms),
        Arc::clone(&control),
        move || {
            let report = brain.tick();
            if report.considered > 0 {
                logging::log_game(&format!("npc tick: {:?}", report));
            }
        },
    )?;

    let mut follower = PathFollower::new(Arc::clone(&ctx), config.grid_refresh_ms)
        .map_err(|err| format!("path follower: {}", err))?;
    let bounds = ctx.bounds;
    let path_handle = spawn_periodic(
        "path-follow",
        Duration::from_millis(config.path_tick_ms),
        Arc::clone(&control),
        move || {
            for echo in &echoes {
                if !follower.is_following(echo) {
                    follower.assign(echo.clone(), Goal::NextTo(rng.roll_coord(bounds)));
                }
            }
            follower.tick();
        },
    )?;

    let deadline = config
        .run_seconds
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    while deadline.map_or(true, |deadline| Instant::now() < deadline) {
        thread::sleep(Duration::from_millis(200));
    }

    control.request_stop();
    for handle in [ai_handle, path_handle] {
        if handle.join().is_err() {
            logging::log_error("worker thread panicked");
        }
    }
    for actor in &present {
        if let Err(err) = lifecycle::leave(&ctx, actor) {
            logging::log_error(&format!("leave {} failed: {}", actor, err));
        }
    }
    if let Some(stats) = ctx.tiles.tile_cache_stats() {
        logging::log_game(&format!(
            "tile cache: {} hits, {} misses, {} evictions, {:.1}% hit rate",
            stats.hits,
            stats.misses,
            stats.evictions,
            stats.hit_rate() * 100.0
        ));
    }
    logging::log_game("tileworld stopped");
    println!("tileworld: stopped");
    Ok(())
}

/// Joins `actor` near a random coordinate. False when no free tile was found
/// or the join lost a race.
fn spawn(ctx: &WorldContext, grid: &Arc<CollisionGrid>, rng: &mut WalkRng, actor: &ActorId) -> bool {
    let cache = match ctx.tick_cache(grid) {
        Ok(cache) => cache,
        Err(err) => {
            logging::log_error(&format!("spawn {}: lock snapshot failed: {}", actor, err));
            return false;
        }
    };
    let around = rng.roll_coord(ctx.bounds);
    let Some(spawn_at) = nearest_free_tile(&cache, around, SPAWN_SEARCH_RADIUS) else {
        logging::log_error(&format!("spawn {}: no free tile near {}", actor, around));
        return false;
    };
    match lifecycle::join(ctx, actor, spawn_at, None) {
        Ok(_) => true,
        Err(err) => {
            logging::log_error(&format!("spawn {} at {} failed: {}", actor, spawn_at, err));
            false
        }
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}
