use serde::{Deserialize, Serialize};

/// Grid coordinate. `y` grows downward, matching client screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordDelta {
    pub dx: i32,
    pub dy: i32,
}

/// Inclusive rectangle of valid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldBounds {
    pub min: Coord,
    pub max: Coord,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, delta: CoordDelta) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(delta.dx)?,
            y: self.y.checked_add(delta.dy)?,
        })
    }

    pub fn step(self, direction: Direction) -> Option<Self> {
        self.offset(direction.delta())
    }

    /// Cardinal neighbours in `Direction::ALL` order.
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(direction))
    }

    /// Saturates at `u32::MAX` for coordinates at opposite ends of the range.
    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    pub fn is_adjacent(self, other: Coord) -> bool {
        self.manhattan(other) == 1
    }

    /// Direction of a single cardinal step from `self` to `other`.
    pub fn direction_to(self, other: Coord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.step(*direction) == Some(other))
    }

    /// Store key fragment, `"x,y"`.
    pub fn key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Direction {
    /// Fixed iteration order used wherever ties must be broken reproducibly.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> CoordDelta {
        match self {
            Direction::Up => CoordDelta { dx: 0, dy: -1 },
            Direction::Down => CoordDelta { dx: 0, dy: 1 },
            Direction::Left => CoordDelta { dx: -1, dy: 0 },
            Direction::Right => CoordDelta { dx: 1, dy: 0 },
        }
    }
}

impl WorldBounds {
    pub const fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// World generated from `-size` to `+size` on both axes.
    pub fn centered(size: i32) -> Self {
        let size = size.abs();
        Self {
            min: Coord::new(-size, -size),
            max: Coord::new(size, size),
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.y >= self.min.y && coord.y <= self.max.y
    }

    pub fn width(&self) -> u32 {
        self.max.x.abs_diff(self.min.x) + 1
    }

    pub fn height(&self) -> u32 {
        self.max.y.abs_diff(self.min.y) + 1
    }

    /// Row-major walk over every coordinate inside the bounds.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Coord::new(x, y)))
    }
}
