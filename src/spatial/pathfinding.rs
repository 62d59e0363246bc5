use crate::spatial::grid::TickCache;
use crate::world::position::{Coord, Direction};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct PathNode {
    coord: Coord,
    parent: Option<usize>,
}

/// Open-set entry. `node` indexes the arena of expanded nodes.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: u32,
    g: u32,
    seq: u64,
    node: usize,
}

/// Min-heap by f, earlier insertion first on ties.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so compare reversed.
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

/// Manhattan distance. Never overestimates on a 4-connected unit-cost grid.
pub fn heuristic(a: Coord, b: Coord) -> u32 {
    a.manhattan(b)
}

/// Shortest 4-connected path from `start` to `end`, both included.
///
/// Every hop must be walkable in `cache` except the last: `end` itself is
/// always accepted so callers can path onto a blocked target. Returns `None`
/// when the open set runs dry.
pub fn find_path(start: Coord, end: Coord, cache: &TickCache) -> Option<Vec<Coord>> {
    if start == end {
        return Some(vec![start]);
    }

    let mut arena = vec![PathNode {
        coord: start,
        parent: None,
    }];
    let mut best_g: HashMap<Coord, u32> = HashMap::from([(start, 0)]);
    let mut closed: HashSet<Coord> = HashSet::new();
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;
    open.push(OpenEntry {
        f: heuristic(start, end),
        g: 0,
        seq,
        node: 0,
    });

    while let Some(entry) = open.pop() {
        let current = arena[entry.node].coord;
        if current == end {
            return Some(reconstruct(&arena, entry.node));
        }
        // Stale duplicate left behind by a cheaper later push.
        if !closed.insert(current) {
            continue;
        }

        for neighbor in current.neighbors() {
            if closed.contains(&neighbor) {
                continue;
            }
            if neighbor != end && !cache.is_walkable(neighbor) {
                continue;
            }
            let g = entry.g.saturating_add(1);
            if best_g.get(&neighbor).is_some_and(|known| *known <= g) {
                continue;
            }
            best_g.insert(neighbor, g);
            arena.push(PathNode {
                coord: neighbor,
                parent: Some(entry.node),
            });
            seq += 1;
            open.push(OpenEntry {
                f: g.saturating_add(heuristic(neighbor, end)),
                g,
                seq,
                node: arena.len() - 1,
            });
        }
    }
    None
}

fn reconstruct(arena: &[PathNode], last: usize) -> Vec<Coord> {
    let mut path = Vec::new();
    let mut cursor = Some(last);
    while let Some(index) = cursor {
        path.push(arena[index].coord);
        cursor = arena[index].parent;
    }
    path.reverse();
    path
}

/// Shortest path from `start` to any walkable tile next to `target`.
///
/// Candidates are tried Up, Down, Left, Right; on equal length the earlier
/// candidate wins. An actor already next to `target` gets `[start]`.
pub fn find_path_to_adjacent(start: Coord, target: Coord, cache: &TickCache) -> Option<Vec<Coord>> {
    if start.is_adjacent(target) {
        return Some(vec![start]);
    }

    let mut best: Option<Vec<Coord>> = None;
    for direction in Direction::ALL {
        let Some(candidate) = target.step(direction) else {
            continue;
        };
        if !cache.is_walkable(candidate) {
            continue;
        }
        if let Some(path) = find_path(start, candidate, cache) {
            if best.as_ref().map_or(true, |current| path.len() < current.len()) {
                best = Some(path);
            }
        }
    }
    best
}
