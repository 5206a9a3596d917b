//! Lakes and coasts. Small enclosed water bodies become lakes, then ocean
//! tiles near land shallow out into coast with a randomized reach.

use std::collections::VecDeque;

use rand::Rng;
use tracing::warn;

use crate::{
    constants::{COAST, LAKES, OCEAN},
    map_generator::randomness::MapGenerationRandomness,
    ruleset::Ruleset,
    tile_map::{TileMap, tile::Tile},
};

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    spawn_lakes(tile_map, ruleset);
    spawn_coasts(tile_map, randomness, ruleset);
}

/// Flood-fills connected water bodies; any not larger than
/// `max_lake_size` turns into lake tiles.
fn spawn_lakes(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let Some(lakes) = ruleset.terrain(LAKES).cloned() else {
        warn!("ruleset has no {LAKES} terrain, skipping lakes");
        return;
    };
    let max_lake_size = tile_map.map_parameters.max_lake_size as usize;
    let mut visited = vec![false; tile_map.grid.size()];

    let all_tiles: Vec<Tile> = tile_map.all_tiles().collect();
    for start in all_tiles {
        if visited[start.index()] || start.is_land(tile_map) {
            continue;
        }
        let mut body = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start.index()] = true;
        while let Some(tile) = queue.pop_front() {
            body.push(tile);
            for neighbor in tile.neighbor_tiles(tile_map) {
                if !visited[neighbor.index()] && neighbor.is_water(tile_map) {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        if body.len() <= max_lake_size {
            for tile in body {
                tile_map.set_base_terrain(tile, &lakes);
            }
        }
    }
}

/// Ocean tiles within a random distance of land become coast. The reach is
/// rolled per tile, so coastlines come out ragged rather than uniform.
fn spawn_coasts(tile_map: &mut TileMap, randomness: &mut MapGenerationRandomness, ruleset: &Ruleset) {
    let Some(coast) = ruleset.terrain(COAST).cloned() else {
        warn!("ruleset has no {COAST} terrain, skipping coasts");
        return;
    };
    let max_extension = tile_map.map_parameters.max_coast_extension;
    if max_extension == 0 {
        return;
    }
    let ocean_tiles: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.base_terrain(tile_map) == OCEAN)
        .collect();
    for tile in ocean_tiles {
        let reach = randomness.rng.random_range(1..=max_extension);
        let near_land = tile
            .tiles_within_distance(reach, tile_map)
            .iter()
            .any(|other| other.is_land(tile_map));
        if near_land {
            tile_map.set_base_terrain(tile, &coast);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::GRASSLAND,
        map_parameters::{MapParameters, MapSize},
    };

    fn map(width: i32, height: i32) -> (TileMap, Ruleset) {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(width, height);
        let tile_map = TileMap::new(parameters, &ruleset).unwrap();
        (tile_map, ruleset)
    }

    #[test]
    fn enclosed_water_becomes_a_lake() {
        let (mut tile_map, ruleset) = map(7, 7);
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        // Land everywhere except one pocket of two water tiles.
        let pocket = [Tile::new(3 + 3 * 7), Tile::new(4 + 3 * 7)];
        for tile in tile_map.all_tiles().collect::<Vec<_>>() {
            if !pocket.contains(&tile) {
                tile_map.set_base_terrain(tile, &grassland);
            }
        }
        spawn_lakes(&mut tile_map, &ruleset);
        for tile in pocket {
            assert_eq!(tile.base_terrain(&tile_map), LAKES);
        }
    }

    #[test]
    fn large_water_bodies_stay_ocean() {
        let (mut tile_map, ruleset) = map(12, 12);
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        // One land tile in a sea far larger than the lake cutoff.
        tile_map.set_base_terrain(Tile::new(0), &grassland);
        spawn_lakes(&mut tile_map, &ruleset);
        assert!(
            tile_map
                .all_tiles()
                .filter(|t| t.is_water(&tile_map))
                .all(|t| t.base_terrain(&tile_map) == OCEAN)
        );
    }

    #[test]
    fn coast_forms_next_to_land() {
        let (mut tile_map, ruleset) = map(9, 9);
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        let center = Tile::new(4 + 4 * 9);
        tile_map.set_base_terrain(center, &grassland);
        let mut randomness = MapGenerationRandomness::new(1);
        spawn_coasts(&mut tile_map, &mut randomness, &ruleset);
        for neighbor in center.neighbor_tiles(&tile_map) {
            assert_eq!(neighbor.base_terrain(&tile_map), COAST);
        }
        // The far corner is outside any possible reach.
        assert_eq!(Tile::new(0).base_terrain(&tile_map), OCEAN);
    }
}
