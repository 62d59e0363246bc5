pub mod actors;
pub mod geo;
pub mod loader;
pub mod position;
pub mod terrain;
pub mod tile_cache;
pub mod tiles;
pub mod time;
