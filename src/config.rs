use crate::workers::npc_ai::AI_TICK_MS;
use crate::workers::path_follow::DEFAULT_GRID_REFRESH_MS;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_WORLD_SIZE: i32 = 50;
pub const DEFAULT_NPC_COUNT: usize = 8;
pub const DEFAULT_ECHO_COUNT: usize = 2;
pub const DEFAULT_TILE_CACHE: usize = 4_096;
pub const DEFAULT_PATH_TICK_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root: PathBuf,
    /// Stop after this many seconds; run until interrupted when absent.
    pub run_seconds: Option<u64>,
    pub world_size: i32,
    pub npc_count: usize,
    pub echo_count: usize,
    pub ai_tick_ms: u64,
    pub path_tick_ms: u64,
    pub grid_refresh_ms: u64,
    pub tile_cache: usize,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: tileworld <asset-root> [run-seconds]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let run_seconds = match args.get(2) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| format!("invalid run-seconds '{}'", value))?,
            ),
            None => None,
        };

        let world_size = env_setting("TILEWORLD_WORLD_SIZE", DEFAULT_WORLD_SIZE);
        if world_size < 1 {
            return Err(format!("world size must be positive, got {}", world_size));
        }
        Ok(Self {
            root,
            run_seconds,
            world_size,
            npc_count: env_setting("TILEWORLD_NPC_COUNT", DEFAULT_NPC_COUNT),
            echo_count: env_setting("TILEWORLD_ECHO_COUNT", DEFAULT_ECHO_COUNT),
            ai_tick_ms: env_setting("TILEWORLD_AI_TICK_MS", AI_TICK_MS).max(1),
            path_tick_ms: env_setting("TILEWORLD_PATH_TICK_MS", DEFAULT_PATH_TICK_MS).max(1),
            grid_refresh_ms: env_setting("TILEWORLD_GRID_REFRESH_MS", DEFAULT_GRID_REFRESH_MS),
            tile_cache: env_setting("TILEWORLD_TILE_CACHE", DEFAULT_TILE_CACHE),
        })
    }
}

fn env_setting<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    parse_setting(name, std::env::var(name).ok(), default)
}

/// Blank or unparsable values keep the default; the latter is reported.
fn parse_setting<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
{
    let Some(value) = raw else {
        return default;
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default;
    }
    match trimmed.parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("tileworld: invalid {} '{}', using {}", name, value, default);
            default
        }
    }
}
