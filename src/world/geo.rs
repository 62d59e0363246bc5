use crate::world::position::Coord;
use std::collections::BTreeMap;

pub const MAX_LONGITUDE: f64 = 180.0;
pub const MAX_LATITUDE: f64 = 85.0;

/// A grid coordinate projected into the ranges a geo radius index accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Scales `coord` so that `[-world_size, world_size]` spans the full
/// longitude range and `[-85, 85]` degrees of latitude. Values outside the
/// world clamp to the extremes. Monotonic in both axes.
pub fn normalize(coord: Coord, world_size: i32) -> GeoPoint {
    let size = f64::from(world_size.abs().max(1));
    let lon = (f64::from(coord.x) / size) * MAX_LONGITUDE;
    let lat = (f64::from(coord.y) / size) * MAX_LATITUDE;
    GeoPoint {
        lon: lon.clamp(-MAX_LONGITUDE, MAX_LONGITUDE),
        lat: lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
    }
}

/// Range-queryable index of member positions.
///
/// Candidates are prefiltered on the projected box around the query, which is
/// valid because `normalize` is monotonic, then confirmed on true grid
/// distance.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    world_size: i32,
    members: BTreeMap<String, (Coord, GeoPoint)>,
}

impl SpatialIndex {
    pub fn new(world_size: i32) -> Self {
        Self {
            world_size,
            members: BTreeMap::new(),
        }
    }

    /// Adds or moves a member.
    pub fn insert(&mut self, member: &str, coord: Coord) {
        let point = normalize(coord, self.world_size);
        self.members.insert(member.to_string(), (coord, point));
    }

    pub fn remove(&mut self, member: &str) -> bool {
        self.members.remove(member).is_some()
    }

    pub fn position(&self, member: &str) -> Option<Coord> {
        self.members.get(member).map(|(coord, _)| *coord)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members within `radius` tiles (euclidean) of `center`, nearest first,
    /// ties by member name.
    pub fn within(&self, center: Coord, radius: u32) -> Vec<(String, Coord)> {
        let radius = i64::from(radius);
        let low = normalize(
            Coord::new(
                saturate(i64::from(center.x) - radius),
                saturate(i64::from(center.y) - radius),
            ),
            self.world_size,
        );
        let high = normalize(
            Coord::new(
                saturate(i64::from(center.x) + radius),
                saturate(i64::from(center.y) + radius),
            ),
            self.world_size,
        );
        let mut found: Vec<(i64, String, Coord)> = self
            .members
            .iter()
            .filter(|(_, (_, point))| {
                point.lon >= low.lon
                    && point.lon <= high.lon
                    && point.lat >= low.lat
                    && point.lat <= high.lat
            })
            .filter_map(|(member, (coord, _))| {
                let dx = i64::from(coord.x) - i64::from(center.x);
                let dy = i64::from(coord.y) - i64::from(center.y);
                let distance_sq = dx * dx + dy * dy;
                (distance_sq <= radius * radius).then(|| (distance_sq, member.clone(), *coord))
            })
            .collect();
        found.sort();
        found
            .into_iter()
            .map(|(_, member, coord)| (member, coord))
            .collect()
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_spans_geo_ranges() {
        let edge = normalize(Coord::new(50, -50), 50);
        assert_eq!(edge, GeoPoint { lon: 180.0, lat: -85.0 });
        let center = normalize(Coord::new(0, 0), 50);
        assert_eq!(center, GeoPoint { lon: 0.0, lat: 0.0 });
    }

    #[test]
    fn normalize_clamps_outside_world() {
        let far = normalize(Coord::new(500, 1_000), 50);
        assert_eq!(far.lon, MAX_LONGITUDE);
        assert_eq!(far.lat, MAX_LATITUDE);
        let far_negative = normalize(Coord::new(-500, -1_000), 50);
        assert_eq!(far_negative.lon, -MAX_LONGITUDE);
        assert_eq!(far_negative.lat, -MAX_LATITUDE);
    }

    #[test]
    fn normalize_is_monotonic() {
        let mut previous = normalize(Coord::new(-60, -60), 50);
        for value in -59..=60 {
            let point = normalize(Coord::new(value, value), 50);
            assert!(point.lon >= previous.lon);
            assert!(point.lat >= previous.lat);
            previous = point;
        }
    }

    #[test]
    fn within_orders_by_distance_then_name() {
        let mut index = SpatialIndex::new(50);
        index.insert("npc:far", Coord::new(4, 0));
        index.insert("player:b", Coord::new(0, 1));
        index.insert("player:a", Coord::new(1, 0));
        index.insert("npc:outside", Coord::new(6, 0));
        index.insert("npc:corner", Coord::new(4, 4));

        let found: Vec<String> = index
            .within(Coord::new(0, 0), 5)
            .into_iter()
            .map(|(member, _)| member)
            .collect();
        assert_eq!(found, vec!["player:a", "player:b", "npc:far"]);
    }

    #[test]
    fn within_matches_at_world_edge() {
        let mut index = SpatialIndex::new(10);
        index.insert("npc:edge", Coord::new(10, 10));
        index.insert("npc:beyond", Coord::new(12, 10));
        let found = index.within(Coord::new(10, 9), 3);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], ("npc:edge".to_string(), Coord::new(10, 10)));
    }

    #[test]
    fn insert_moves_existing_member() {
        let mut index = SpatialIndex::new(50);
        index.insert("npc:1", Coord::new(0, 0));
        index.insert("npc:1", Coord::new(20, 20));
        assert_eq!(index.len(), 1);
        assert_eq!(index.position("npc:1"), Some(Coord::new(20, 20)));
        assert!(index.within(Coord::new(0, 0), 3).is_empty());
        assert!(index.remove("npc:1"));
        assert!(index.is_empty());
    }
}
