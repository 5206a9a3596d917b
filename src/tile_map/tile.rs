use arrayvec::ArrayVec;

use crate::{
    grid::{hex::Direction, offset_coordinate::OffsetCoordinate},
    ruleset::{Ruleset, terrain::Terrain, unique::UniqueType},
    tile_map::{RiverFlags, TileMap},
};

/// A copy handle for one tile: the index into the map's parallel storage
/// vectors. All state lives in [`TileMap`]; accessors borrow it per call, so
/// handles stay valid across mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile(usize);

impl Tile {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    pub fn offset_coordinate(&self, tile_map: &TileMap) -> OffsetCoordinate {
        tile_map.grid.offset_of(self.0)
    }

    pub fn latitude(&self, tile_map: &TileMap) -> f64 {
        tile_map.grid.latitude(self.0)
    }

    pub fn longitude(&self, tile_map: &TileMap) -> f64 {
        tile_map.grid.longitude(self.0)
    }

    pub fn neighbor_tile(&self, direction: Direction, tile_map: &TileMap) -> Option<Tile> {
        tile_map.grid.neighbor(self.0, direction).map(Tile)
    }

    pub fn neighbor_tiles(&self, tile_map: &TileMap) -> ArrayVec<Tile, 6> {
        tile_map.grid.neighbors(self.0).into_iter().map(Tile).collect()
    }

    pub fn tiles_at_distance(&self, distance: u32, tile_map: &TileMap) -> Vec<Tile> {
        tile_map
            .grid
            .tiles_at_distance(self.0, distance)
            .into_iter()
            .map(Tile)
            .collect()
    }

    pub fn tiles_within_distance(&self, distance: u32, tile_map: &TileMap) -> Vec<Tile> {
        tile_map
            .grid
            .tiles_within_distance(self.0, distance)
            .into_iter()
            .map(Tile)
            .collect()
    }

    pub fn distance_to(&self, other: Tile, tile_map: &TileMap) -> i32 {
        tile_map.grid.distance(self.0, other.0)
    }

    #[inline]
    pub fn base_terrain<'a>(&self, tile_map: &'a TileMap) -> &'a str {
        &tile_map.base_terrain_list[self.0]
    }

    #[inline]
    pub fn is_water(&self, tile_map: &TileMap) -> bool {
        tile_map.is_water_list[self.0]
    }

    #[inline]
    pub fn is_land(&self, tile_map: &TileMap) -> bool {
        !tile_map.is_water_list[self.0]
    }

    /// Impassable through the base terrain, a feature, or a natural wonder.
    #[inline]
    pub fn is_impassable(&self, tile_map: &TileMap) -> bool {
        tile_map.impassable_list[self.0]
    }

    #[inline]
    pub fn features<'a>(&self, tile_map: &'a TileMap) -> &'a [String] {
        &tile_map.feature_list[self.0]
    }

    pub fn has_feature(&self, feature: &str, tile_map: &TileMap) -> bool {
        tile_map.feature_list[self.0].iter().any(|f| f == feature)
    }

    pub fn is_hill(&self, tile_map: &TileMap) -> bool {
        self.has_feature(crate::constants::HILL, tile_map)
    }

    #[inline]
    pub fn natural_wonder<'a>(&self, tile_map: &'a TileMap) -> Option<&'a str> {
        tile_map.natural_wonder_list[self.0].as_deref()
    }

    #[inline]
    pub fn resource<'a>(&self, tile_map: &'a TileMap) -> Option<(&'a str, u32)> {
        tile_map.resource_list[self.0]
            .as_ref()
            .map(|(name, amount)| (name.as_str(), *amount))
    }

    #[inline]
    pub fn improvement<'a>(&self, tile_map: &'a TileMap) -> Option<&'a str> {
        tile_map.improvement_list[self.0].as_deref()
    }

    /// The topmost terrain: the last feature if any, else the base terrain.
    /// `occursOn` checks for features and resources look at this.
    pub fn last_terrain_name<'a>(&self, tile_map: &'a TileMap) -> &'a str {
        tile_map.feature_list[self.0]
            .last()
            .map(String::as_str)
            .unwrap_or_else(|| self.base_terrain(tile_map))
    }

    /// Base terrain plus features, in stacking order.
    pub fn terrain_names<'a>(&self, tile_map: &'a TileMap) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.base_terrain(tile_map))
            .chain(tile_map.feature_list[self.0].iter().map(String::as_str))
    }

    /// The ruleset entries for this tile's base terrain and features, in
    /// stacking order. Silently skips names absent from the ruleset.
    pub fn terrains<'a>(
        &self,
        tile_map: &'a TileMap,
        ruleset: &'a Ruleset,
    ) -> impl Iterator<Item = &'a Terrain> {
        self.terrain_names(tile_map)
            .filter_map(move |name| ruleset.terrain(name))
    }

    /// Land with at least one water neighbor.
    pub fn is_coastal_tile(&self, tile_map: &TileMap) -> bool {
        self.is_land(tile_map)
            && self
                .neighbor_tiles(tile_map)
                .iter()
                .any(|neighbor| neighbor.is_water(tile_map))
    }

    pub fn is_adjacent_to(&self, terrain: &str, tile_map: &TileMap) -> bool {
        self.neighbor_tiles(tile_map).iter().any(|neighbor| {
            neighbor.base_terrain(tile_map) == terrain
                || neighbor.has_feature(terrain, tile_map)
        })
    }

    pub fn river_flags(&self, tile_map: &TileMap) -> RiverFlags {
        tile_map.river_flags_list[self.0]
    }

    /// A river runs along one of this tile's six edges. The tile's own flags
    /// cover the south, south-west, and south-east edges; the remaining three
    /// edges are owned by the north, north-east, and north-west neighbors.
    pub fn is_adjacent_to_river(&self, tile_map: &TileMap) -> bool {
        if !self.river_flags(tile_map).is_empty() {
            return true;
        }
        let flows_toward_me = [
            (Direction::North, RiverFlags::BOTTOM),
            (Direction::NorthEast, RiverFlags::BOTTOM_LEFT),
            (Direction::NorthWest, RiverFlags::BOTTOM_RIGHT),
        ];
        flows_toward_me.iter().any(|&(direction, flag)| {
            self.neighbor_tile(direction, tile_map)
                .is_some_and(|neighbor| neighbor.river_flags(tile_map).contains(flag))
        })
    }

    /// Rivers or an adjacent fresh-water terrain (lake, oasis).
    pub fn is_adjacent_to_fresh_water(&self, tile_map: &TileMap, ruleset: &Ruleset) -> bool {
        if self.is_adjacent_to_river(tile_map) {
            return true;
        }
        self.neighbor_tiles(tile_map).iter().any(|neighbor| {
            neighbor
                .terrains(tile_map, ruleset)
                .any(|terrain| terrain.has_unique(UniqueType::FreshWater))
        })
    }

    #[inline]
    pub fn continent_id(&self, tile_map: &TileMap) -> i32 {
        tile_map.continent_id_list[self.0]
    }

    #[inline]
    pub fn region_id(&self, tile_map: &TileMap) -> i32 {
        tile_map.region_id_list[self.0]
    }

    /// The region-balancing fertility of this tile, summed from terrain
    /// uniques plus fresh-water and optionally coastal boosts. An
    /// override-fertility unique short-circuits everything else.
    pub fn fertility(&self, check_coasts: bool, tile_map: &TileMap, ruleset: &Ruleset) -> i32 {
        let mut fertility = 0;
        for terrain in self.terrains(tile_map, ruleset) {
            if let Some(unique) = terrain
                .matching_uniques(UniqueType::OverrideFertility)
                .next()
            {
                return unique.param_i32(0);
            }
            fertility += terrain
                .matching_uniques(UniqueType::AddFertility)
                .map(|unique| unique.param_i32(0))
                .sum::<i32>();
        }
        if self.is_adjacent_to_river(tile_map) {
            fertility += 1;
        } else if self.is_adjacent_to_fresh_water(tile_map, ruleset) {
            fertility += 1;
        }
        if check_coasts && self.is_coastal_tile(tile_map) {
            fertility += 2;
        }
        fertility
    }
}
