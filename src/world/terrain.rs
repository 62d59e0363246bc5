use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const TERRAIN_FILE: &str = "terrain.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainType(pub String);

impl TerrainType {
    pub const GROUND: &'static str = "ground";
    pub const WATER: &'static str = "water";
    pub const TREE: &'static str = "tree";
    pub const ROCK: &'static str = "rock";
    pub const WOODEN_WALL: &'static str = "wooden_wall";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn ground() -> Self {
        Self::new(Self::GROUND)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TerrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainProperties {
    pub impassable: bool,
    pub buildable: bool,
    pub movement_penalty: bool,
    pub gatherable: bool,
    pub destructible: bool,
    pub max_health: u32,
}

/// Static terrain definitions, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainCatalog {
    entries: BTreeMap<TerrainType, TerrainProperties>,
}

impl TerrainCatalog {
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            TerrainType::new(TerrainType::GROUND),
            TerrainProperties {
                buildable: true,
                ..TerrainProperties::default()
            },
        );
        entries.insert(
            TerrainType::new(TerrainType::WATER),
            TerrainProperties {
                movement_penalty: true,
                ..TerrainProperties::default()
            },
        );
        entries.insert(
            TerrainType::new(TerrainType::TREE),
            TerrainProperties {
                impassable: true,
                gatherable: true,
                max_health: 2,
                ..TerrainProperties::default()
            },
        );
        entries.insert(
            TerrainType::new(TerrainType::ROCK),
            TerrainProperties {
                impassable: true,
                gatherable: true,
                max_health: 4,
                ..TerrainProperties::default()
            },
        );
        entries.insert(
            TerrainType::new(TerrainType::WOODEN_WALL),
            TerrainProperties {
                impassable: true,
                destructible: true,
                max_health: 10,
                ..TerrainProperties::default()
            },
        );
        Self { entries }
    }

    /// Parses a mapping of terrain name to properties.
    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        let entries: BTreeMap<TerrainType, TerrainProperties> = serde_yaml::from_str(text)
            .map_err(|err| format!("terrain catalog parse failed: {}", err))?;
        if entries.is_empty() {
            return Err("terrain catalog is empty".to_string());
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| format!("read {} failed: {}", path.display(), err))?;
        Self::from_yaml_str(&text)
    }

    /// `<root>/terrain.yaml` when present, the built-in table otherwise.
    pub fn load_or_builtin(root: &Path) -> Result<Self, String> {
        let path = root.join(TERRAIN_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn properties(&self, terrain: &TerrainType) -> Option<&TerrainProperties> {
        self.entries.get(terrain)
    }

    /// Unknown terrain is passable.
    pub fn is_impassable(&self, terrain: &TerrainType) -> bool {
        self.properties(terrain)
            .map(|properties| properties.impassable)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TerrainCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_marks_resources_and_walls_impassable() {
        let catalog = TerrainCatalog::builtin();
        assert!(catalog.is_impassable(&TerrainType::new(TerrainType::TREE)));
        assert!(catalog.is_impassable(&TerrainType::new(TerrainType::ROCK)));
        assert!(catalog.is_impassable(&TerrainType::new(TerrainType::WOODEN_WALL)));
        assert!(!catalog.is_impassable(&TerrainType::ground()));
        let water = catalog
            .properties(&TerrainType::new(TerrainType::WATER))
            .expect("water");
        assert!(water.movement_penalty);
        assert!(!water.impassable);
    }

    #[test]
    fn unknown_terrain_is_passable() {
        let catalog = TerrainCatalog::builtin();
        let lava = TerrainType::new("lava");
        assert!(catalog.properties(&lava).is_none());
        assert!(!catalog.is_impassable(&lava));
    }

    #[test]
    fn yaml_catalog_fills_missing_fields_with_defaults() {
        let catalog = TerrainCatalog::from_yaml_str(
            "ground:\n  buildable: true\nlava:\n  impassable: true\n  max_health: 3\n",
        )
        .expect("parse");
        assert_eq!(catalog.len(), 2);
        let lava = catalog.properties(&TerrainType::new("lava")).expect("lava");
        assert!(lava.impassable);
        assert!(!lava.movement_penalty);
        assert_eq!(lava.max_health, 3);
    }

    #[test]
    fn yaml_catalog_rejects_garbage() {
        assert!(TerrainCatalog::from_yaml_str("- not\n- a map\n").is_err());
        assert!(TerrainCatalog::from_yaml_str("{}").is_err());
    }
}
