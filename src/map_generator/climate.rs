//! Humidity and temperature: two low-frequency noise fields pick a biome
//! base terrain for every land tile. Temperature leans heavily on latitude,
//! humidity is pure noise. Terrains declare the climate rectangles they
//! occupy; rulesets without such declarations fall back to a fixed table.

use tracing::warn;

use crate::{
    constants::{DESERT, GRASSLAND, PLAINS, SNOW, TUNDRA},
    map_generator::randomness::MapGenerationRandomness,
    ruleset::{Ruleset, terrain::Terrain, unique::UniqueType},
    tile_map::{TileMap, tile::Tile},
};

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let humidity_seed = randomness.next_noise_seed();
    let temperature_seed = randomness.next_noise_seed();
    let scale = tile_map.map_parameters.tiles_per_biome_area as f64;

    let limit_terrains: Vec<Terrain> = ruleset
        .base_terrains()
        .filter(|terrain| {
            terrain.is_land() && terrain.has_unique(UniqueType::TemperatureAndHumidityRange)
        })
        .cloned()
        .collect();
    let use_legacy_table = limit_terrains.is_empty();
    let mut unmatched_warned = false;

    let assignable: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| {
            tile.is_land(tile_map)
                && !ruleset
                    .terrain(tile.base_terrain(tile_map))
                    .is_some_and(|t| t.has_unique(UniqueType::OccursInChains))
        })
        .collect();

    for tile in assignable {
        let humidity = humidity_at(tile, tile_map, randomness, humidity_seed, scale);
        let temperature = temperature_at(tile, tile_map, randomness, temperature_seed, scale);

        let terrain = if use_legacy_table {
            ruleset.terrain(legacy_biome(temperature, humidity))
        } else {
            limit_terrains
                .iter()
                .find(|terrain| terrain.matches_climate(temperature, humidity))
                .or_else(|| {
                    if !unmatched_warned {
                        warn!(
                            temperature,
                            humidity, "no terrain declares this climate, using first land terrain"
                        );
                        unmatched_warned = true;
                    }
                    ruleset.first_land_terrain()
                })
        };
        if let Some(terrain) = terrain {
            tile_map.set_base_terrain(tile, terrain);
        }
    }
}

pub(crate) fn humidity_at(
    tile: Tile,
    tile_map: &TileMap,
    randomness: &MapGenerationRandomness,
    seed: f64,
    scale: f64,
) -> f64 {
    let mut humidity =
        (randomness.perlin_noise_custom(tile, tile_map, seed, 1, scale) + 1.0) / 2.0;
    let shift = tile_map.map_parameters.temperature_shift;
    if shift < 0.0 {
        // A colder world is also a wetter one.
        humidity = (humidity - shift / 2.0).clamp(0.0, 1.0);
    }
    humidity
}

pub(crate) fn temperature_at(
    tile: Tile,
    tile_map: &TileMap,
    randomness: &MapGenerationRandomness,
    seed: f64,
    scale: f64,
) -> f64 {
    let latitude_temperature = 1.0 - 2.0 * tile.latitude(tile_map);
    let random_temperature = randomness.perlin_noise_custom(tile, tile_map, seed, 1, scale);
    let temperature = (5.0 * latitude_temperature + random_temperature) / 6.0;
    let exponent = 1.0 - tile_map.map_parameters.temperature_extremeness;
    (pow_signed(temperature, exponent) + tile_map.map_parameters.temperature_shift)
        .clamp(-1.0, 1.0)
}

/// Biome choice when no terrain declares climate ranges.
fn legacy_biome(temperature: f64, humidity: f64) -> &'static str {
    if temperature < -0.4 {
        if humidity < 0.5 { SNOW } else { TUNDRA }
    } else if temperature < 0.8 {
        if humidity < 0.5 { PLAINS } else { GRASSLAND }
    } else if humidity < 0.7 {
        DESERT
    } else {
        PLAINS
    }
}

fn pow_signed(value: f64, exponent: f64) -> f64 {
    value.abs().powf(exponent) * value.signum()
}
