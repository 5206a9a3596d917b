//! Rivers flow along tile edges, not through tiles. A river is a walk over
//! hex vertices: each vertex is named by the tile whose bottom-left or
//! bottom-right corner it is, and each step between adjacent vertices stamps
//! a river flag onto the tile that owns the crossed edge. Walks start far
//! inland, preferably on mountains, and always step toward the nearest water.

use rand::Rng;
use tracing::info;

use crate::{
    constants::{DESERT, FLOOD_PLAINS, PLAINS, SNOW, TUNDRA},
    grid::hex::Direction,
    map_generator::randomness::MapGenerationRandomness,
    ruleset::{Ruleset, unique::UniqueType},
    tile_map::{RiverFlags, TileMap, tile::Tile},
};

/// Hard cap on steps per river, against pathological candidate cycles.
const MAX_RIVER_LENGTH: u32 = 666;

/// Sources must have no water within this many tiles.
const MIN_SOURCE_WATER_DISTANCE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BottomSide {
    Left,
    Right,
}

/// A hex vertex, named by the tile it sits under. Every vertex of the grid
/// is the bottom-left or bottom-right corner of exactly one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RiverCoordinate {
    tile: Tile,
    side: BottomSide,
}

impl RiverCoordinate {
    /// The up-to-three tiles meeting at this vertex.
    fn touching_tiles(&self, tile_map: &TileMap) -> Vec<Tile> {
        let mut tiles = vec![self.tile];
        let directions = match self.side {
            BottomSide::Left => [Direction::South, Direction::SouthWest],
            BottomSide::Right => [Direction::South, Direction::SouthEast],
        };
        for direction in directions {
            if let Some(neighbor) = self.tile.neighbor_tile(direction, tile_map) {
                tiles.push(neighbor);
            }
        }
        tiles
    }

    fn touches_water(&self, tile_map: &TileMap) -> bool {
        self.touching_tiles(tile_map)
            .iter()
            .any(|tile| tile.is_water(tile_map))
    }

    /// Adjacent vertices, each paired with the tile and flag of the edge a
    /// step to it would cross.
    fn adjacent(&self, tile_map: &TileMap) -> Vec<(RiverCoordinate, Tile, RiverFlags)> {
        let mut result = Vec::with_capacity(3);
        match self.side {
            BottomSide::Left => {
                result.push((
                    RiverCoordinate { tile: self.tile, side: BottomSide::Right },
                    self.tile,
                    RiverFlags::BOTTOM,
                ));
                if let Some(north_west) = self.tile.neighbor_tile(Direction::NorthWest, tile_map) {
                    result.push((
                        RiverCoordinate { tile: north_west, side: BottomSide::Right },
                        self.tile,
                        RiverFlags::BOTTOM_LEFT,
                    ));
                }
                if let Some(south_west) = self.tile.neighbor_tile(Direction::SouthWest, tile_map) {
                    result.push((
                        RiverCoordinate { tile: south_west, side: BottomSide::Right },
                        south_west,
                        RiverFlags::BOTTOM_RIGHT,
                    ));
                }
            }
            BottomSide::Right => {
                result.push((
                    RiverCoordinate { tile: self.tile, side: BottomSide::Left },
                    self.tile,
                    RiverFlags::BOTTOM,
                ));
                if let Some(north_east) = self.tile.neighbor_tile(Direction::NorthEast, tile_map) {
                    result.push((
                        RiverCoordinate { tile: north_east, side: BottomSide::Left },
                        self.tile,
                        RiverFlags::BOTTOM_RIGHT,
                    ));
                }
                if let Some(south_east) = self.tile.neighbor_tile(Direction::SouthEast, tile_map) {
                    result.push((
                        RiverCoordinate { tile: south_east, side: BottomSide::Left },
                        south_east,
                        RiverFlags::BOTTOM_LEFT,
                    ));
                }
            }
        }
        result
    }
}

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    if tile_map.map_parameters.no_rivers {
        return;
    }
    let number_of_rivers = tile_map.land_tile_count() / 100;
    if number_of_rivers == 0 {
        soften_river_banks(tile_map, ruleset);
        return;
    }

    let water_distance = distance_to_water_field(tile_map);
    let sources = river_sources(number_of_rivers, tile_map, randomness, ruleset);
    info!(rivers = sources.len(), "spawning rivers");
    for source in sources {
        spawn_river(source, tile_map, randomness, &water_distance);
    }
    soften_river_banks(tile_map, ruleset);
}

/// Multi-source BFS from every water tile, in tile steps. Water tiles are 0.
fn distance_to_water_field(tile_map: &TileMap) -> Vec<u32> {
    let mut distances = vec![u32::MAX; tile_map.grid.size()];
    let mut queue = std::collections::VecDeque::new();
    for tile in tile_map.all_tiles() {
        if tile.is_water(tile_map) {
            distances[tile.index()] = 0;
            queue.push_back(tile);
        }
    }
    while let Some(tile) = queue.pop_front() {
        let next = distances[tile.index()] + 1;
        for neighbor in tile.neighbor_tiles(tile_map) {
            if distances[neighbor.index()] > next {
                distances[neighbor.index()] = next;
                queue.push_back(neighbor);
            }
        }
    }
    distances
}

/// Spread-out source tiles, preferring mountains, then hills, then any land,
/// each required to be far from water.
fn river_sources(
    number: usize,
    tile_map: &TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) -> Vec<Tile> {
    let far_from_water = |tile: &Tile| {
        tile.tiles_within_distance(MIN_SOURCE_WATER_DISTANCE, tile_map)
            .iter()
            .all(|other| other.is_land(tile_map))
    };
    let is_mountain = |tile: &Tile| {
        ruleset
            .terrain(tile.base_terrain(tile_map))
            .is_some_and(|t| t.has_unique(UniqueType::OccursInChains))
    };

    let mut candidates: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| is_mountain(tile) && far_from_water(tile))
        .collect();
    if candidates.len() < number {
        candidates.extend(
            tile_map
                .all_tiles()
                .filter(|tile| tile.is_hill(tile_map) && far_from_water(tile)),
        );
    }
    if candidates.len() < number {
        candidates.extend(tile_map.all_tiles().filter(|tile| {
            tile.is_land(tile_map)
                && !is_mountain(tile)
                && !tile.is_hill(tile_map)
                && far_from_water(tile)
        }));
    }
    randomness.choose_spread_out_locations(
        number,
        &candidates,
        tile_map.map_parameters.map_size.radius(),
        tile_map,
    )
}

fn spawn_river(
    source: Tile,
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    water_distance: &[u32],
) {
    let side = if randomness.rng.random_range(0..2) == 0 {
        BottomSide::Left
    } else {
        BottomSide::Right
    };
    let mut current = RiverCoordinate { tile: source, side };
    let mut visited = std::collections::HashSet::from([current]);

    for _ in 0..MAX_RIVER_LENGTH {
        if current.touches_water(tile_map) {
            return;
        }
        let Some((next, flag_tile, flag)) = current
            .adjacent(tile_map)
            .into_iter()
            .filter(|(vertex, _, _)| !visited.contains(vertex))
            .min_by_key(|(vertex, _, _)| {
                vertex
                    .touching_tiles(tile_map)
                    .iter()
                    .map(|tile| water_distance[tile.index()])
                    .min()
                    .unwrap_or(u32::MAX)
            })
        else {
            return;
        };
        tile_map.add_river_flags(flag_tile, flag);
        visited.insert(next);
        current = next;
    }
}

/// River banks moderate the terrain: bare desert grows flood plains, snow
/// thaws to tundra, tundra to plains.
fn soften_river_banks(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let flood_plains = ruleset.terrain(FLOOD_PLAINS).cloned();
    let tundra = ruleset.terrain(TUNDRA).cloned();
    let plains = ruleset.terrain(PLAINS).cloned();
    let river_banks: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map) && tile.is_adjacent_to_river(tile_map))
        .collect();
    for tile in river_banks {
        match tile.base_terrain(tile_map) {
            DESERT if tile.features(tile_map).is_empty() => {
                if let Some(flood_plains) = &flood_plains {
                    tile_map.add_feature(tile, flood_plains);
                }
            }
            SNOW => {
                if let Some(tundra) = &tundra {
                    tile_map.set_base_terrain(tile, tundra);
                }
            }
            TUNDRA => {
                if let Some(plains) = &plains {
                    tile_map.set_base_terrain(tile, plains);
                }
            }
            _ => {}
        }
    }
}
