//! Landmass macro-patterns: every tile gets a land-or-water base terrain
//! from noise plus a pattern-specific shaping term, thresholded against the
//! configured water threshold. Patterns with coverage guarantees retry with
//! a relaxed threshold, bounded so generation always terminates.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    MapGenerationError,
    map_generator::randomness::MapGenerationRandomness,
    map_parameters::{MapShape, MapType},
    ruleset::{Ruleset, terrain::Terrain},
    tile_map::{TileMap, tile::Tile},
};

/// Retry cap for the fractal and small-continents water-fraction bound.
const WATER_FRACTION_RETRIES: u32 = 5;
/// Hard ceiling on the final water fraction for those patterns.
const MAX_WATER_FRACTION: f64 = 0.7;
/// Pangaea keeps retrying until one landmass holds this share of all land.
const PANGAEA_DOMINANCE: f64 = 0.75;
const PANGAEA_RETRIES: u32 = 10;

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) -> Result<(), MapGenerationError> {
    let land = ruleset
        .first_land_terrain()
        .ok_or(MapGenerationError::NoLandTerrain)?
        .clone();
    let water = ruleset
        .first_water_terrain()
        .ok_or(MapGenerationError::NoWaterTerrain)?
        .clone();

    let water_threshold = tile_map.map_parameters.water_threshold;
    match tile_map.map_parameters.map_type {
        MapType::Perlin => {
            let elevations = perlin_elevations(tile_map, randomness);
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::Fractal => {
            let seed = randomness.next_noise_seed();
            let elevations: Vec<f64> = tile_map
                .all_tiles()
                .map(|tile| randomness.perlin_noise_custom(tile, tile_map, seed, 8, 6.0))
                .collect();
            assign_bounded_water(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::SmallContinents => {
            let seed = randomness.next_noise_seed();
            let elevations: Vec<f64> = tile_map
                .all_tiles()
                .map(|tile| randomness.ridged_noise(tile, tile_map, seed))
                .collect();
            assign_bounded_water(tile_map, &elevations, 0.55 + water_threshold, &land, &water);
        }
        MapType::Archipelago => {
            let seed = randomness.next_noise_seed();
            let elevations: Vec<f64> = tile_map
                .all_tiles()
                .map(|tile| randomness.ridged_noise(tile, tile_map, seed))
                .collect();
            assign(tile_map, &elevations, 0.25 + water_threshold, &land, &water);
        }
        MapType::Pangaea => {
            generate_pangaea(tile_map, randomness, water_threshold, &land, &water);
        }
        MapType::InnerSea => {
            let elevations = shaped_elevations(tile_map, randomness, |noise, lon, lat| {
                let center_distance = (lon * lon + lat * lat).sqrt() / std::f64::consts::SQRT_2;
                noise * 0.3 + center_distance - 0.35
            });
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::TwoContinents => {
            let elevations = shaped_elevations(tile_map, randomness, |noise, lon, _| {
                let factor = lon.abs().min(1.0 - lon.abs()) * 2.0;
                noise * 0.4 + factor - 0.4
            });
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::ThreeContinents => {
            let elevations = shaped_elevations(tile_map, randomness, |noise, lon, _| {
                let factor = (1.5 * std::f64::consts::PI * lon).cos().abs();
                noise * 0.4 + factor - 0.4
            });
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::FourCorners => {
            let elevations = shaped_elevations(tile_map, randomness, |noise, lon, lat| {
                let east_west = 1.0 - (lon.abs() - 0.5).abs() * 2.0;
                let north_south = (std::f64::consts::PI * lat).sin();
                noise * 0.4 + east_west * north_south - 0.45
            });
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::ContinentAndIslands => {
            let continent_seed = randomness.next_noise_seed();
            let island_seed = randomness.next_noise_seed();
            let elevations: Vec<f64> = tile_map
                .all_tiles()
                .map(|tile| {
                    let lon = tile.longitude(tile_map);
                    let noise = randomness.perlin_noise(tile, tile_map, continent_seed);
                    let continent = noise * 0.4 + (1.0 - (lon + 0.5).abs() * 2.0).max(0.0) - 0.4;
                    if lon > 0.0 {
                        let island =
                            randomness.ridged_noise(tile, tile_map, island_seed) - 0.7;
                        continent.max(island)
                    } else {
                        continent
                    }
                })
                .collect();
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::Lakes => {
            let elevations = shaped_elevations(tile_map, randomness, |noise, _, _| noise + 0.6);
            assign(tile_map, &elevations, water_threshold, &land, &water);
        }
        MapType::Empty => {
            // The map starts as all ocean.
        }
    }

    apply_shape_overrides(tile_map, &water);

    if tile_map.map_parameters.map_type != MapType::Empty && tile_map.land_tile_count() == 0 {
        warn!("landmass pattern produced no land at all, forcing one tile");
        let center = Tile::new(tile_map.grid.center_tile());
        tile_map.set_base_terrain(center, &land);
    }
    Ok(())
}

fn perlin_elevations(tile_map: &TileMap, randomness: &mut MapGenerationRandomness) -> Vec<f64> {
    let seed = randomness.next_noise_seed();
    tile_map
        .all_tiles()
        .map(|tile| randomness.perlin_noise(tile, tile_map, seed))
        .collect()
}

fn shaped_elevations(
    tile_map: &TileMap,
    randomness: &mut MapGenerationRandomness,
    shape: impl Fn(f64, f64, f64) -> f64,
) -> Vec<f64> {
    let seed = randomness.next_noise_seed();
    tile_map
        .all_tiles()
        .map(|tile| {
            let noise = randomness.perlin_noise(tile, tile_map, seed);
            shape(noise, tile.longitude(tile_map), tile.latitude(tile_map))
        })
        .collect()
}

fn assign(
    tile_map: &mut TileMap,
    elevations: &[f64],
    threshold: f64,
    land: &Terrain,
    water: &Terrain,
) {
    for (index, &elevation) in elevations.iter().enumerate() {
        let tile = Tile::new(index);
        if elevation < threshold {
            tile_map.set_base_terrain(tile, water);
        } else {
            tile_map.set_base_terrain(tile, land);
        }
    }
}

/// Assigns land and water, lowering the threshold until the water share is
/// at or below the bound. The final percentile clamp guarantees the bound
/// for any seed once the retries run out.
fn assign_bounded_water(
    tile_map: &mut TileMap,
    elevations: &[f64],
    threshold: f64,
    land: &Terrain,
    water: &Terrain,
) {
    let mut threshold = threshold;
    for _ in 0..=WATER_FRACTION_RETRIES {
        if water_fraction(elevations, threshold) <= MAX_WATER_FRACTION {
            break;
        }
        threshold -= 0.05;
    }
    if water_fraction(elevations, threshold) > MAX_WATER_FRACTION {
        let mut sorted = elevations.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        threshold = sorted[(MAX_WATER_FRACTION * sorted.len() as f64) as usize];
        debug!(threshold, "clamped water threshold to the 70th percentile");
    }
    assign(tile_map, elevations, threshold, land, water);
}

fn water_fraction(elevations: &[f64], threshold: f64) -> f64 {
    elevations.iter().filter(|e| **e < threshold).count() as f64 / elevations.len() as f64
}

fn generate_pangaea(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    water_threshold: f64,
    land: &Terrain,
    water: &Terrain,
) {
    let elevations = shaped_elevations(tile_map, randomness, |noise, lon, lat| {
        let center_distance = (lon * lon + lat * lat).sqrt();
        noise + 0.3 - 0.6 * center_distance
    });
    for attempt in 0..=PANGAEA_RETRIES {
        let threshold = water_threshold - 0.05 * attempt as f64;
        assign(tile_map, &elevations, threshold, land, water);
        let dominance = largest_landmass_fraction(tile_map);
        if dominance >= PANGAEA_DOMINANCE {
            return;
        }
        debug!(attempt, dominance, "pangaea landmass not dominant enough, relaxing threshold");
    }
    // Bounded retries exhausted, accept what is there.
}

/// Share of all land tiles held by the largest connected landmass.
fn largest_landmass_fraction(tile_map: &TileMap) -> f64 {
    let total_land = tile_map.land_tile_count();
    if total_land == 0 {
        return 0.0;
    }
    let size = tile_map.grid.size();
    let mut visited = vec![false; size];
    let mut largest = 0usize;
    for start in 0..size {
        if visited[start] || Tile::new(start).is_water(tile_map) {
            continue;
        }
        let mut component = 0usize;
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(index) = queue.pop_front() {
            component += 1;
            for neighbor in tile_map.grid.neighbors(index) {
                if !visited[neighbor] && Tile::new(neighbor).is_land(tile_map) {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        largest = largest.max(component);
    }
    largest as f64 / total_land as f64
}

fn apply_shape_overrides(tile_map: &mut TileMap, water: &Terrain) {
    let width = tile_map.grid.width;
    let height = tile_map.grid.height;
    match tile_map.map_parameters.shape {
        MapShape::Rectangular => {}
        MapShape::FlatEarth => {
            let edge_tiles: Vec<Tile> = tile_map
                .all_tiles()
                .filter(|tile| {
                    let offset = tile.offset_coordinate(tile_map);
                    offset.x == 0
                        || offset.x == width - 1
                        || offset.y == 0
                        || offset.y == height - 1
                })
                .collect();
            for tile in edge_tiles {
                tile_map.set_base_terrain(tile, water);
            }
        }
        MapShape::Hexagonal => {
            let center = tile_map.grid.center_tile();
            let radius = (width.min(height) - 1) / 2;
            let outside: Vec<Tile> = tile_map
                .all_tiles()
                .filter(|tile| tile_map.grid.distance(center, tile.index()) > radius)
                .collect();
            for tile in outside {
                tile_map.set_base_terrain(tile, water);
            }
        }
    }
    if tile_map.map_parameters.world_wrap {
        // Keep the seam navigable.
        let seam: Vec<Tile> = tile_map
            .all_tiles()
            .filter(|tile| {
                let x = tile.offset_coordinate(tile_map).x;
                x == 0 || x == width - 1
            })
            .collect();
        for tile in seam {
            tile_map.set_base_terrain(tile, water);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_parameters::{MapParameters, MapSize};

    fn generated_map(map_type: MapType, seed: u64, width: i32, height: i32) -> TileMap {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_type = map_type;
        parameters.map_size = MapSize::new(width, height);
        parameters.seed = seed;
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(seed);
        generate(&mut tile_map, &mut randomness, &ruleset).unwrap();
        tile_map
    }

    #[test]
    fn fractal_water_fraction_is_bounded() {
        for seed in [1, 7, 42, 1234, 98765] {
            let tile_map = generated_map(MapType::Fractal, seed, 30, 24);
            let water = tile_map.grid.size() - tile_map.land_tile_count();
            assert!(
                water as f64 <= MAX_WATER_FRACTION * tile_map.grid.size() as f64 + 1.0,
                "seed {seed} produced {water} water tiles"
            );
        }
    }

    #[test]
    fn small_continents_water_fraction_is_bounded() {
        for seed in [2, 11, 77] {
            let tile_map = generated_map(MapType::SmallContinents, seed, 30, 24);
            let water = tile_map.grid.size() - tile_map.land_tile_count();
            assert!(water as f64 <= MAX_WATER_FRACTION * tile_map.grid.size() as f64 + 1.0);
        }
    }

    #[test]
    fn pangaea_is_dominated_by_one_landmass() {
        let tile_map = generated_map(MapType::Pangaea, 42, 30, 24);
        assert!(largest_landmass_fraction(&tile_map) >= PANGAEA_DOMINANCE);
    }

    #[test]
    fn empty_map_stays_water() {
        let tile_map = generated_map(MapType::Empty, 1, 10, 10);
        assert_eq!(tile_map.land_tile_count(), 0);
    }

    #[test]
    fn hexagonal_shape_drowns_the_corners() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_type = MapType::Lakes;
        parameters.shape = MapShape::Hexagonal;
        parameters.map_size = MapSize::new(15, 15);
        parameters.seed = 5;
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(5);
        generate(&mut tile_map, &mut randomness, &ruleset).unwrap();

        let corner = Tile::new(0);
        assert!(corner.is_water(&tile_map));
        let center = Tile::new(tile_map.grid.center_tile());
        assert!(center.is_land(&tile_map));
    }

    #[test]
    fn non_empty_patterns_always_have_land() {
        for map_type in [
            MapType::Perlin,
            MapType::Archipelago,
            MapType::InnerSea,
            MapType::TwoContinents,
            MapType::ThreeContinents,
            MapType::FourCorners,
            MapType::ContinentAndIslands,
            MapType::Lakes,
        ] {
            let tile_map = generated_map(map_type, 9, 20, 16);
            assert!(tile_map.land_tile_count() > 0, "{map_type:?} has no land");
        }
    }
}
