//! Elevation: a noise pass sorts land into flat / hill / mountain bands,
//! then two cellular-automata passes pull mountains into chains and hills
//! into clusters. Both run a fixed 5 rounds with two-phase mark-then-commit
//! so a round's changes never cascade within itself.

use rand::Rng;
use tracing::warn;

use crate::{
    map_generator::randomness::MapGenerationRandomness,
    ruleset::{Ruleset, terrain::Terrain, unique::UniqueType},
    tile_map::{TileMap, tile::Tile},
};

const CELLULAR_ROUNDS: u32 = 5;

/// Per-tile scratch mark for one cellular round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElevationMark {
    None,
    Raise,
    Lower,
}

/// How raising and lowering is realized depends on what the ruleset defines:
/// mountains may be a base terrain, hills may be a feature, either may be
/// missing entirely.
enum TileMutator {
    Noop,
    Base { elevated: Terrain, flat: Terrain },
    Feature { elevated: Terrain },
}

impl TileMutator {
    fn new(elevated: Option<&Terrain>, flat: &Terrain) -> Self {
        match elevated {
            None => TileMutator::Noop,
            Some(terrain) if terrain.is_base_terrain() => TileMutator::Base {
                elevated: terrain.clone(),
                flat: flat.clone(),
            },
            Some(terrain) => TileMutator::Feature {
                elevated: terrain.clone(),
            },
        }
    }

    fn raise(&self, tile: Tile, tile_map: &mut TileMap) {
        match self {
            TileMutator::Noop => {}
            TileMutator::Base { elevated, .. } => tile_map.set_base_terrain(tile, elevated),
            TileMutator::Feature { elevated } => tile_map.add_feature(tile, elevated),
        }
    }

    fn lower(&self, tile: Tile, tile_map: &mut TileMap, ruleset: &Ruleset) {
        match self {
            TileMutator::Noop => {}
            TileMutator::Base { elevated, flat } => {
                if tile.base_terrain(tile_map) == elevated.name {
                    tile_map.set_base_terrain(tile, flat);
                }
            }
            TileMutator::Feature { elevated } => {
                tile_map.remove_feature(tile, &elevated.name, ruleset);
            }
        }
    }

    fn is_elevated(&self, tile: Tile, tile_map: &TileMap) -> bool {
        match self {
            TileMutator::Noop => false,
            TileMutator::Base { elevated, .. } => tile.base_terrain(tile_map) == elevated.name,
            TileMutator::Feature { elevated } => tile.has_feature(&elevated.name, tile_map),
        }
    }
}

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let Some(flat) = ruleset
        .base_terrains()
        .find(|t| t.is_land() && !t.impassable && !t.has_unique(UniqueType::RoughTerrain))
        .cloned()
    else {
        warn!("ruleset has no flat land terrain, skipping elevation");
        return;
    };
    let mountain_mutator = TileMutator::new(ruleset.mountain_terrain(), &flat);
    let hill_mutator = TileMutator::new(ruleset.hill_terrain(), &flat);

    raise_mountains_and_hills(tile_map, randomness, &mountain_mutator, &hill_mutator, ruleset);
    cellular_mountain_ranges(tile_map, randomness, &mountain_mutator, &hill_mutator, ruleset);
    cellular_hills(tile_map, randomness, &mountain_mutator, &hill_mutator, ruleset);
}

fn raise_mountains_and_hills(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    mountain_mutator: &TileMutator,
    hill_mutator: &TileMutator,
    ruleset: &Ruleset,
) {
    let seed = randomness.next_noise_seed();
    let exponent = 1.0 - tile_map.map_parameters.elevation_exponent;
    let land_tiles: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map))
        .collect();
    for tile in land_tiles {
        let elevation = pow_signed(randomness.perlin_noise(tile, tile_map, seed), exponent);
        if elevation <= 0.5 {
            // stays flat
        } else if elevation <= 0.7 {
            hill_mutator.raise(tile, tile_map);
        } else {
            hill_mutator.lower(tile, tile_map, ruleset);
            mountain_mutator.raise(tile, tile_map);
        }
    }
}

/// Mountains with no mountain neighbor tend to sink, tiles next to exactly
/// one mountain tend to rise, and anything walled in by impassable neighbors
/// gets forced down. Total raises are capped at twice the initial count,
/// total lowers at half of that target.
fn cellular_mountain_ranges(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    mountain_mutator: &TileMutator,
    hill_mutator: &TileMutator,
    ruleset: &Ruleset,
) {
    if matches!(mountain_mutator, TileMutator::Noop) {
        return;
    }
    let count_mountains = |tile_map: &TileMap| {
        tile_map
            .all_tiles()
            .filter(|tile| mountain_mutator.is_elevated(*tile, tile_map))
            .count()
    };
    let target_mountains = count_mountains(tile_map) * 2;
    let land_tiles: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map))
        .collect();

    for _ in 0..CELLULAR_ROUNDS {
        let mut total_mountains = count_mountains(tile_map);
        let mut marks = vec![ElevationMark::None; tile_map.grid.size()];

        for &tile in &land_tiles {
            let neighbors = tile.neighbor_tiles(tile_map);
            let adjacent_mountains = neighbors
                .iter()
                .filter(|n| mountain_mutator.is_elevated(**n, tile_map))
                .count();
            let adjacent_impassible = impassable_neighbors(tile, tile_map);
            if adjacent_mountains == 0 && mountain_mutator.is_elevated(tile, tile_map) {
                if randomness.rng.random_range(0..4) == 0 {
                    marks[tile.index()] = ElevationMark::Lower;
                }
            } else if adjacent_mountains == 1 {
                if randomness.rng.random_range(0..10) == 0 {
                    marks[tile.index()] = ElevationMark::Raise;
                }
            } else if adjacent_impassible == 3 {
                if randomness.rng.random_range(0..2) == 0 {
                    marks[tile.index()] = ElevationMark::Lower;
                }
            } else if adjacent_impassible > 3 {
                marks[tile.index()] = ElevationMark::Lower;
            }
        }

        for &tile in &land_tiles {
            match marks[tile.index()] {
                ElevationMark::Raise => {
                    if total_mountains >= target_mountains {
                        continue;
                    }
                    if !mountain_mutator.is_elevated(tile, tile_map) {
                        hill_mutator.lower(tile, tile_map, ruleset);
                        mountain_mutator.raise(tile, tile_map);
                        total_mountains += 1;
                    }
                }
                ElevationMark::Lower => {
                    if total_mountains * 2 <= target_mountains {
                        continue;
                    }
                    if mountain_mutator.is_elevated(tile, tile_map) {
                        mountain_mutator.lower(tile, tile_map, ruleset);
                        hill_mutator.raise(tile, tile_map);
                        total_mountains -= 1;
                    }
                }
                ElevationMark::None => {}
            }
        }
    }
}

/// Smooths hills into clusters, holding the total near the initial count.
fn cellular_hills(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    mountain_mutator: &TileMutator,
    hill_mutator: &TileMutator,
    ruleset: &Ruleset,
) {
    if matches!(hill_mutator, TileMutator::Noop) {
        return;
    }
    let count_hills = |tile_map: &TileMap| {
        tile_map
            .all_tiles()
            .filter(|tile| hill_mutator.is_elevated(*tile, tile_map))
            .count()
    };
    let target_hills = count_hills(tile_map);
    let land_tiles: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map))
        .collect();

    for round in 1..=CELLULAR_ROUNDS {
        let mut total_hills = count_hills(tile_map);
        let mut marks = vec![ElevationMark::None; tile_map.grid.size()];

        for &tile in &land_tiles {
            if mountain_mutator.is_elevated(tile, tile_map) {
                continue;
            }
            let neighbors = tile.neighbor_tiles(tile_map);
            let adjacent_mountains = neighbors
                .iter()
                .filter(|n| mountain_mutator.is_elevated(**n, tile_map))
                .count();
            let adjacent_hills = neighbors
                .iter()
                .filter(|n| hill_mutator.is_elevated(**n, tile_map))
                .count();
            if adjacent_hills <= 1 && adjacent_mountains == 0 {
                if randomness.rng.random_range(0..2) == 0 {
                    marks[tile.index()] = ElevationMark::Lower;
                }
            } else if adjacent_hills > 3 && adjacent_mountains == 0 {
                if randomness.rng.random_range(0..2) == 0 {
                    marks[tile.index()] = ElevationMark::Lower;
                }
            } else if (2..=3).contains(&(adjacent_hills + adjacent_mountains))
                && randomness.rng.random_range(0..2) == 0
            {
                marks[tile.index()] = ElevationMark::Raise;
            }
        }

        for &tile in &land_tiles {
            match marks[tile.index()] {
                ElevationMark::Raise => {
                    if total_hills > target_hills && round != 1 {
                        continue;
                    }
                    if !hill_mutator.is_elevated(tile, tile_map) {
                        hill_mutator.raise(tile, tile_map);
                        total_hills += 1;
                    }
                }
                ElevationMark::Lower => {
                    if !(total_hills as f64 >= target_hills as f64 * 0.9 || round == 1) {
                        continue;
                    }
                    if hill_mutator.is_elevated(tile, tile_map) {
                        hill_mutator.lower(tile, tile_map, ruleset);
                        total_hills -= 1;
                    }
                }
                ElevationMark::None => {}
            }
        }
    }
}

/// Impassable through base terrain or a feature, so an ice shelf walls a
/// tile in just like a mountain ridge does.
fn impassable_neighbors(tile: Tile, tile_map: &TileMap) -> usize {
    tile.neighbor_tiles(tile_map)
        .iter()
        .filter(|neighbor| neighbor.is_impassable(tile_map))
        .count()
}

fn pow_signed(value: f64, exponent: f64) -> f64 {
    value.abs().powf(exponent) * value.signum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{GRASSLAND, ICE, MOUNTAIN},
        map_generator::landmass,
        map_parameters::{MapParameters, MapSize, MapType},
    };

    fn elevated_map(seed: u64) -> TileMap {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_type = MapType::Pangaea;
        parameters.map_size = MapSize::new(30, 24);
        parameters.seed = seed;
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(seed);
        landmass::generate(&mut tile_map, &mut randomness, &ruleset).unwrap();
        generate(&mut tile_map, &mut randomness, &ruleset);
        tile_map
    }

    #[test]
    fn pow_signed_keeps_the_sign() {
        assert!(pow_signed(-0.5, 0.3) < 0.0);
        assert!(pow_signed(0.5, 0.3) > 0.0);
        assert_eq!(pow_signed(0.0, 0.3), 0.0);
    }

    #[test]
    fn elevation_only_touches_land() {
        let tile_map = elevated_map(42);
        for tile in tile_map.all_tiles() {
            if tile.is_water(&tile_map) {
                assert_ne!(tile.base_terrain(&tile_map), MOUNTAIN);
                assert!(!tile.is_hill(&tile_map));
            }
        }
    }

    #[test]
    fn hills_and_mountains_never_stack() {
        let tile_map = elevated_map(7);
        for tile in tile_map.all_tiles() {
            if tile.base_terrain(&tile_map) == MOUNTAIN {
                assert!(!tile.is_hill(&tile_map), "mountain tile also has a hill");
            }
        }
    }

    #[test]
    fn walling_in_counts_impassable_features_too() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(8, 8);
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let center = Tile::new(3 + 3 * 8);
        tile_map.set_base_terrain(center, ruleset.terrain(GRASSLAND).unwrap());
        let ice = ruleset.terrain(ICE).unwrap();
        let frozen: Vec<Tile> = center.neighbor_tiles(&tile_map).iter().copied().take(4).collect();
        for tile in &frozen {
            tile_map.add_feature(*tile, ice);
        }
        // Ocean bases are passable; the ice features are what wall it in.
        assert_eq!(impassable_neighbors(center, &tile_map), 4);
    }

    #[test]
    fn some_terrain_gets_elevated() {
        let tile_map = elevated_map(42);
        let mountains = tile_map
            .all_tiles()
            .filter(|t| t.base_terrain(&tile_map) == MOUNTAIN)
            .count();
        let hills = tile_map.all_tiles().filter(|t| t.is_hill(&tile_map)).count();
        assert!(mountains + hills > 0);
    }
}
