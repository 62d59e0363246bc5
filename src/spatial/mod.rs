pub mod grid;
pub mod locks;
pub mod pathfinding;

pub use grid::{CollisionGrid, TickCache};
pub use locks::TileLocks;
pub use pathfinding::{find_path, find_path_to_adjacent};
