use crate::store::StoreError;
use crate::world::position::{Coord, WorldBounds};
use crate::world::terrain::{TerrainCatalog, TerrainType};
use crate::world::tiles::{Tile, WorldStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const WORLD_FILE: &str = "world.yaml";

/// Layout of `world.yaml`.
///
/// ```yaml
/// fill: ground        # null leaves unlisted coordinates void
/// tiles:
///   - { x: 3, y: 0, type: tree }
///   - { x: 0, y: 0, type: ground, isSanctuary: true }
/// ```
#[derive(Debug, Deserialize)]
struct WorldFile {
    #[serde(default = "default_fill")]
    fill: Option<TerrainType>,
    #[serde(default)]
    tiles: Vec<Tile>,
}

fn default_fill() -> Option<TerrainType> {
    Some(TerrainType::ground())
}

/// Every coordinate in `bounds` set to `terrain`, row-major.
pub fn flat_world(bounds: WorldBounds, terrain: &TerrainType, catalog: &TerrainCatalog) -> Vec<Tile> {
    bounds
        .coords()
        .map(|coord| with_default_health(Tile::new(coord, terrain.clone()), catalog))
        .collect()
}

pub fn parse_world(text: &str, bounds: WorldBounds, catalog: &TerrainCatalog) -> Result<Vec<Tile>, String> {
    let file: WorldFile = serde_yaml::from_str(text)
        .map_err(|err| format!("world file parse failed: {}", err))?;

    let mut tiles: BTreeMap<Coord, Tile> = match &file.fill {
        Some(terrain) => flat_world(bounds, terrain, catalog)
            .into_iter()
            .map(|tile| (tile.coord(), tile))
            .collect(),
        None => BTreeMap::new(),
    };
    for tile in file.tiles {
        let coord = tile.coord();
        if !bounds.contains(coord) {
            return Err(format!("world tile {} lies outside the world", coord));
        }
        if catalog.properties(&tile.terrain).is_none() {
            return Err(format!("world tile {} has unknown terrain {}", coord, tile.terrain));
        }
        tiles.insert(coord, with_default_health(tile, catalog));
    }
    Ok(tiles.into_values().collect())
}

/// `<root>/world.yaml` when present, an all-ground world otherwise.
pub fn load_or_flat(root: &Path, bounds: WorldBounds, catalog: &TerrainCatalog) -> Result<Vec<Tile>, String> {
    let path = root.join(WORLD_FILE);
    if !path.exists() {
        return Ok(flat_world(bounds, &TerrainType::ground(), catalog));
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|err| format!("read {} failed: {}", path.display(), err))?;
    parse_world(&text, bounds, catalog)
}

/// Writes `tiles` into the world store.
pub fn seed(world: &dyn WorldStore, tiles: &[Tile]) -> Result<usize, StoreError> {
    for tile in tiles {
        world.set_tile(tile)?;
    }
    Ok(tiles.len())
}

fn with_default_health(mut tile: Tile, catalog: &TerrainCatalog) -> Tile {
    if tile.health == 0 {
        if let Some(properties) = catalog.properties(&tile.terrain) {
            tile.health = properties.max_health;
        }
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::world::tiles::KvWorldStore;
    use std::sync::Arc;

    #[test]
    fn flat_world_covers_bounds() {
        let bounds = WorldBounds::centered(2);
        let tiles = flat_world(bounds, &TerrainType::ground(), &TerrainCatalog::builtin());
        assert_eq!(tiles.len(), 25);
        assert_eq!(tiles[0].coord(), Coord::new(-2, -2));
        assert!(tiles.iter().all(|tile| tile.terrain == TerrainType::ground()));
    }

    #[test]
    fn overrides_replace_fill_and_get_catalog_health() {
        let text = r#"
tiles:
  - { x: 1, y: 0, type: tree }
  - { x: 0, y: 0, type: ground, isSanctuary: true }
  - { x: -1, y: 0, type: rock, health: 1 }
"#;
        let tiles = parse_world(text, WorldBounds::centered(1), &TerrainCatalog::builtin())
            .expect("parse");
        assert_eq!(tiles.len(), 9);
        let at = |x, y| {
            tiles
                .iter()
                .find(|tile| tile.coord() == Coord::new(x, y))
                .expect("tile")
        };
        assert_eq!(at(1, 0).terrain.as_str(), TerrainType::TREE);
        assert_eq!(at(1, 0).health, 2);
        assert_eq!(at(-1, 0).health, 1);
        assert!(at(0, 0).sanctuary);
        assert!(!at(0, 1).sanctuary);
    }

    #[test]
    fn null_fill_leaves_void() {
        let text = "fill: null\ntiles:\n  - { x: 0, y: 0, type: water }\n";
        let tiles = parse_world(text, WorldBounds::centered(3), &TerrainCatalog::builtin())
            .expect("parse");
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn rejects_tiles_outside_world_or_with_unknown_terrain() {
        let catalog = TerrainCatalog::builtin();
        let outside = "tiles:\n  - { x: 9, y: 0, type: tree }\n";
        assert!(parse_world(outside, WorldBounds::centered(2), &catalog).is_err());
        let unknown = "tiles:\n  - { x: 0, y: 0, type: lava }\n";
        assert!(parse_world(unknown, WorldBounds::centered(2), &catalog).is_err());
    }

    #[test]
    fn seed_writes_every_tile() {
        let world = KvWorldStore::new(Arc::new(MemoryStore::new()), 4);
        let tiles = flat_world(WorldBounds::centered(1), &TerrainType::ground(), &TerrainCatalog::builtin());
        assert_eq!(seed(&world, &tiles).expect("seed"), 9);
        assert_eq!(world.tiles().expect("tiles").len(), 9);
    }
}
