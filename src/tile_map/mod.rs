//! Dense tile storage. Every per-tile attribute lives in its own vector
//! indexed by [`Tile::index`], so stages iterate whichever attribute they
//! need without touching the rest.

pub mod tile;

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::{
    MapGenerationError,
    grid::{Grid, offset_coordinate::Rectangle},
    map_parameters::MapParameters,
    ruleset::{Ruleset, terrain::Terrain},
    tile_map::tile::Tile,
};

bitflags! {
    /// River edges owned by a tile. A flat-top hex owns its south (bottom),
    /// south-west (bottom-left), and south-east (bottom-right) edges; the
    /// other three edges belong to the respective neighbors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RiverFlags: u8 {
        const BOTTOM = 1;
        const BOTTOM_LEFT = 1 << 1;
        const BOTTOM_RIGHT = 1 << 2;
    }
}

/// Sentinel for "no continent": water tiles and not-yet-assigned land.
pub const NO_CONTINENT: i32 = -1;

/// Sentinel for "no region": water, and land the region balancer never
/// claimed for any civilization.
pub const NO_REGION: i32 = -1;

#[derive(Debug, Clone)]
pub struct TileMap {
    pub map_parameters: MapParameters,
    pub grid: Grid,
    base_terrain_list: Vec<String>,
    is_water_list: Vec<bool>,
    impassable_list: Vec<bool>,
    base_impassable_list: Vec<bool>,
    feature_impassable_list: Vec<bool>,
    wonder_impassable_list: Vec<bool>,
    feature_list: Vec<Vec<String>>,
    natural_wonder_list: Vec<Option<String>>,
    resource_list: Vec<Option<(String, u32)>>,
    improvement_list: Vec<Option<String>>,
    river_flags_list: Vec<RiverFlags>,
    pub continent_id_list: Vec<i32>,
    /// Region index per tile, written by the region balancer and read by the
    /// resource stage for per-region scoping.
    pub region_id_list: Vec<i32>,
    /// Continent id -> tile count, rebuilt by the continent stage.
    pub continent_sizes: BTreeMap<i32, u32>,
    /// Civilization name -> chosen starting tile, in assignment order.
    pub starting_locations: Vec<(String, Tile)>,
}

impl TileMap {
    /// Creates a map filled with the ruleset's first water base terrain.
    pub fn new(map_parameters: MapParameters, ruleset: &Ruleset) -> Result<Self, MapGenerationError> {
        let water = ruleset
            .first_water_terrain()
            .ok_or(MapGenerationError::NoWaterTerrain)?;
        let grid = Grid::new(
            map_parameters.map_size.width,
            map_parameters.map_size.height,
            map_parameters.world_wrap,
        );
        let size = grid.size();
        Ok(Self {
            map_parameters,
            grid,
            base_terrain_list: vec![water.name.clone(); size],
            is_water_list: vec![true; size],
            impassable_list: vec![water.impassable; size],
            base_impassable_list: vec![water.impassable; size],
            feature_impassable_list: vec![false; size],
            wonder_impassable_list: vec![false; size],
            feature_list: vec![Vec::new(); size],
            natural_wonder_list: vec![None; size],
            resource_list: vec![None; size],
            improvement_list: vec![None; size],
            river_flags_list: vec![RiverFlags::empty(); size],
            continent_id_list: vec![NO_CONTINENT; size],
            region_id_list: vec![NO_REGION; size],
            continent_sizes: BTreeMap::new(),
            starting_locations: Vec::new(),
        })
    }

    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn all_tiles(&self) -> impl Iterator<Item = Tile> + use<> {
        self.grid.iter_indices().map(Tile::new)
    }

    pub fn land_tile_count(&self) -> usize {
        self.is_water_list.iter().filter(|water| !**water).count()
    }

    /// Tiles inside the rectangle that are on the map, row by row. Columns
    /// past the seam of a wrapping map normalize back into range.
    pub fn tiles_in_rectangle<'a>(
        &'a self,
        rectangle: &Rectangle,
    ) -> impl Iterator<Item = Tile> + 'a {
        rectangle
            .iter()
            .filter_map(|coordinate| self.grid.index_of(coordinate).map(Tile::new))
    }

    pub fn set_base_terrain(&mut self, tile: Tile, terrain: &Terrain) {
        debug_assert!(terrain.is_base_terrain(), "{} is not a base terrain", terrain.name);
        let index = tile.index();
        terrain.name.clone_into(&mut self.base_terrain_list[index]);
        self.is_water_list[index] = terrain.is_water();
        self.base_impassable_list[index] = terrain.impassable;
        self.update_impassable(index);
    }

    pub fn add_feature(&mut self, tile: Tile, feature: &Terrain) {
        let index = tile.index();
        if self.feature_list[index].iter().any(|f| *f == feature.name) {
            return;
        }
        self.feature_list[index].push(feature.name.clone());
        if feature.impassable {
            self.feature_impassable_list[index] = true;
            self.update_impassable(index);
        }
    }

    pub fn remove_feature(&mut self, tile: Tile, feature_name: &str, ruleset: &Ruleset) {
        let index = tile.index();
        self.feature_list[index].retain(|f| f != feature_name);
        self.feature_impassable_list[index] = self.feature_list[index]
            .iter()
            .any(|name| ruleset.terrain(name).is_some_and(|t| t.impassable));
        self.update_impassable(index);
    }

    pub fn clear_features(&mut self, tile: Tile) {
        let index = tile.index();
        self.feature_list[index].clear();
        self.feature_impassable_list[index] = false;
        self.update_impassable(index);
    }

    pub fn set_natural_wonder(&mut self, tile: Tile, wonder: &Terrain) {
        let index = tile.index();
        self.natural_wonder_list[index] = Some(wonder.name.clone());
        self.wonder_impassable_list[index] = wonder.impassable;
        self.update_impassable(index);
    }

    pub fn clear_natural_wonder(&mut self, tile: Tile) {
        let index = tile.index();
        self.natural_wonder_list[index] = None;
        self.wonder_impassable_list[index] = false;
        self.update_impassable(index);
    }

    pub fn set_resource(&mut self, tile: Tile, resource_name: &str, amount: u32) {
        self.resource_list[tile.index()] = Some((resource_name.to_owned(), amount));
    }

    pub fn clear_resource(&mut self, tile: Tile) {
        self.resource_list[tile.index()] = None;
    }

    pub fn clear_all_resources(&mut self) {
        self.resource_list.fill(None);
    }

    pub fn set_improvement(&mut self, tile: Tile, improvement_name: &str) {
        self.improvement_list[tile.index()] = Some(improvement_name.to_owned());
    }

    pub fn clear_improvement(&mut self, tile: Tile) {
        self.improvement_list[tile.index()] = None;
    }

    pub fn add_river_flags(&mut self, tile: Tile, flags: RiverFlags) {
        self.river_flags_list[tile.index()] |= flags;
    }

    pub fn clear_all_rivers(&mut self) {
        self.river_flags_list.fill(RiverFlags::empty());
    }

    pub fn has_any_river(&self) -> bool {
        self.river_flags_list.iter().any(|flags| !flags.is_empty())
    }

    pub fn reset_continents(&mut self) {
        self.continent_id_list.fill(NO_CONTINENT);
        self.continent_sizes.clear();
    }

    pub fn add_starting_location(&mut self, nation_name: &str, tile: Tile) {
        self.starting_locations.push((nation_name.to_owned(), tile));
    }

    fn update_impassable(&mut self, index: usize) {
        self.impassable_list[index] = self.base_impassable_list[index]
            || self.feature_impassable_list[index]
            || self.wonder_impassable_list[index];
    }
}
