//! Terrain features on top of the biome bases: vegetation from a coarse
//! noise field, rare features from a straight dice roll, and polar ice on
//! cold water.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{
    map_generator::{climate, randomness::MapGenerationRandomness},
    ruleset::{Ruleset, terrain::Terrain, unique::UniqueType},
    tile_map::{TileMap, tile::Tile},
};

/// Coarser than the biome fields, so woods come in patches.
const VEGETATION_SCALE: f64 = 3.0;

/// Tiles colder than this freeze even when no ice terrain declares a range.
const DEFAULT_ICE_TEMPERATURE: f64 = -0.8;

pub fn spawn_vegetation(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let vegetation: Vec<Terrain> = ruleset
        .features()
        .filter(|terrain| terrain.has_unique(UniqueType::Vegetation))
        .cloned()
        .collect();
    if vegetation.is_empty() {
        return;
    }
    let seed = randomness.next_noise_seed();
    let threshold = tile_map.map_parameters.vegetation_richness * 2.0 - 1.0;

    let candidates: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map) && !tile.is_impassable(tile_map))
        .collect();
    for tile in candidates {
        let eligible: Vec<&Terrain> = vegetation
            .iter()
            .filter(|terrain| terrain.occurs_on(tile.last_terrain_name(tile_map)))
            .collect();
        if eligible.is_empty() {
            continue;
        }
        let noise = randomness.perlin_noise_custom(tile, tile_map, seed, 1, VEGETATION_SCALE);
        if noise < threshold {
            if let Some(chosen) = eligible.choose(&mut randomness.rng) {
                tile_map.add_feature(tile, chosen);
            }
        }
    }
}

pub fn spawn_rare_features(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let rare: Vec<Terrain> = ruleset
        .features()
        .filter(|terrain| terrain.has_unique(UniqueType::RareFeature))
        .cloned()
        .collect();
    if rare.is_empty() {
        return;
    }
    let richness = tile_map.map_parameters.rare_features_richness;
    let candidates: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.features(tile_map).is_empty())
        .collect();
    for tile in candidates {
        if randomness.rng.random::<f64>() > richness {
            continue;
        }
        let eligible: Vec<&Terrain> = rare
            .iter()
            .filter(|terrain| terrain.occurs_on(tile.last_terrain_name(tile_map)))
            .collect();
        if let Some(chosen) = eligible.choose(&mut randomness.rng) {
            tile_map.add_feature(tile, chosen);
        }
    }
}

/// Freezes cold water. Ice-like features are the impassable features that
/// occur only on water bases; each may declare its own climate range, and
/// those that don't use a fixed cold threshold.
pub fn spawn_ice(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let water_bases: Vec<&str> = ruleset
        .base_terrains()
        .filter(|terrain| terrain.is_water())
        .map(|terrain| terrain.name.as_str())
        .collect();
    let ice_equivalents: Vec<Terrain> = ruleset
        .features()
        .filter(|terrain| {
            terrain.impassable
                && !terrain.occurs_on.is_empty()
                && terrain
                    .occurs_on
                    .iter()
                    .all(|name| water_bases.contains(&name.as_str()))
        })
        .cloned()
        .collect();
    if ice_equivalents.is_empty() {
        return;
    }

    let humidity_seed = randomness.next_noise_seed();
    let temperature_seed = randomness.next_noise_seed();
    let scale = tile_map.map_parameters.tiles_per_biome_area as f64;
    let candidates: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_water(tile_map) && tile.features(tile_map).is_empty())
        .collect();

    for tile in candidates {
        if !ice_equivalents
            .iter()
            .any(|terrain| terrain.occurs_on(tile.base_terrain(tile_map)))
        {
            continue;
        }
        let temperature =
            climate::temperature_at(tile, tile_map, randomness, temperature_seed, scale);
        let humidity = climate::humidity_at(tile, tile_map, randomness, humidity_seed, scale);
        let eligible: Vec<&Terrain> = ice_equivalents
            .iter()
            .filter(|terrain| terrain.occurs_on(tile.base_terrain(tile_map)))
            .filter(|terrain| {
                if terrain.has_unique(UniqueType::TemperatureAndHumidityRange) {
                    terrain.matches_climate(temperature, humidity)
                } else {
                    temperature < DEFAULT_ICE_TEMPERATURE
                }
            })
            .collect();
        if let Some(chosen) = eligible.choose(&mut randomness.rng) {
            tile_map.add_feature(tile, chosen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{FOREST, GRASSLAND, ICE, JUNGLE, MOUNTAIN},
        map_parameters::{MapParameters, MapSize},
    };

    fn grassland_map(width: i32, height: i32) -> (TileMap, Ruleset) {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(width, height);
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        for tile in tile_map.all_tiles().collect::<Vec<_>>() {
            tile_map.set_base_terrain(tile, &grassland);
        }
        (tile_map, ruleset)
    }

    #[test]
    fn vegetation_respects_occurs_on() {
        let (mut tile_map, ruleset) = grassland_map(16, 16);
        tile_map.map_parameters.vegetation_richness = 1.0;
        let mut randomness = MapGenerationRandomness::new(3);
        spawn_vegetation(&mut tile_map, &mut randomness, &ruleset);
        let mut grown = 0;
        for tile in tile_map.all_tiles() {
            for feature in tile.features(&tile_map) {
                assert!([FOREST, JUNGLE].contains(&feature.as_str()));
                let terrain = ruleset.terrain(feature).unwrap();
                assert!(terrain.occurs_on(GRASSLAND));
                grown += 1;
            }
        }
        // Full richness means every tile qualifies.
        assert_eq!(grown, 16 * 16);
    }

    #[test]
    fn mountains_stay_bare() {
        let (mut tile_map, ruleset) = grassland_map(10, 10);
        tile_map.map_parameters.vegetation_richness = 1.0;
        let mountain = ruleset.terrain(MOUNTAIN).unwrap().clone();
        let peak = Tile::new(5 + 5 * 10);
        tile_map.set_base_terrain(peak, &mountain);
        let mut randomness = MapGenerationRandomness::new(3);
        spawn_vegetation(&mut tile_map, &mut randomness, &ruleset);
        assert!(peak.features(&tile_map).is_empty());
    }

    #[test]
    fn zero_richness_spawns_no_rare_features() {
        let (mut tile_map, ruleset) = grassland_map(10, 10);
        tile_map.map_parameters.rare_features_richness = 0.0;
        let mut randomness = MapGenerationRandomness::new(3);
        spawn_rare_features(&mut tile_map, &mut randomness, &ruleset);
        assert!(tile_map.all_tiles().all(|t| t.features(&tile_map).is_empty()));
    }

    #[test]
    fn rare_features_land_on_matching_terrain() {
        let (mut tile_map, ruleset) = grassland_map(16, 16);
        tile_map.map_parameters.rare_features_richness = 1.0;
        let mut randomness = MapGenerationRandomness::new(3);
        spawn_rare_features(&mut tile_map, &mut randomness, &ruleset);
        let spawned = tile_map
            .all_tiles()
            .flat_map(|t| t.features(&tile_map).to_vec())
            .count();
        assert!(spawned > 0);
        for tile in tile_map.all_tiles() {
            for feature in tile.features(&tile_map) {
                assert!(ruleset.terrain(feature).unwrap().occurs_on(GRASSLAND));
            }
        }
    }

    #[test]
    fn ice_forms_only_on_cold_water() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(20, 30);
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(3);
        spawn_ice(&mut tile_map, &mut randomness, &ruleset);
        let mut frozen_latitudes = Vec::new();
        for tile in tile_map.all_tiles() {
            if tile.has_feature(ICE, &tile_map) {
                assert!(tile.is_water(&tile_map));
                frozen_latitudes.push(tile.latitude(&tile_map));
            }
        }
        assert!(!frozen_latitudes.is_empty(), "an all-ocean map should freeze at the poles");
        for latitude in frozen_latitudes {
            assert!(latitude > 0.5, "ice at latitude {latitude}");
        }
    }
}
