//! Procedural hexagonal world-map generation: landmasses, elevation,
//! climate, lakes and coasts, vegetation, ice, continents, rivers, natural
//! wonders, balanced starting regions, resources, and ancient ruins, all
//! driven by one seed for fully reproducible maps.
//!
//! ```
//! use hex_world_generator::{generate_map, MapParameters, Ruleset};
//!
//! let mut parameters = MapParameters::default();
//! parameters.seed = 42;
//! let map = generate_map(parameters, &Ruleset::vanilla()).unwrap();
//! assert!(map.land_tile_count() > 0);
//! ```

pub mod constants;
pub mod grid;
pub mod map_generator;
pub mod map_parameters;
pub mod ruleset;
pub mod tile_map;

use thiserror::Error;
use tracing::info;

pub use crate::{
    map_generator::{MapGeneratorStep, generate_single_step, regress_single_step},
    map_parameters::{MapParameters, MapShape, MapSize, MapType},
    ruleset::Ruleset,
    tile_map::{TileMap, tile::Tile},
};
use crate::map_generator::{
    climate, continents, elevation, features, hydrology, landmass, natural_wonders,
    randomness::MapGenerationRandomness, regions, resources, rivers, ruins,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapGenerationError {
    #[error("the ruleset defines no land base terrain")]
    NoLandTerrain,
    #[error("the ruleset defines no water base terrain")]
    NoWaterTerrain,
}

/// Runs the full pipeline and returns the finished map. A zero seed is
/// resolved from the clock first, so pass a fixed nonzero seed for
/// reproducible output.
pub fn generate_map(
    mut parameters: MapParameters,
    ruleset: &Ruleset,
) -> Result<TileMap, MapGenerationError> {
    let seed = parameters.resolve_seed();
    parameters.created_with_version = env!("CARGO_PKG_VERSION").to_owned();
    info!(
        seed,
        map_type = ?parameters.map_type,
        width = parameters.map_size.width,
        height = parameters.map_size.height,
        "generating map"
    );

    let mut tile_map = TileMap::new(parameters, ruleset)?;
    let mut randomness = MapGenerationRandomness::new(seed);

    landmass::generate(&mut tile_map, &mut randomness, ruleset)?;
    elevation::generate(&mut tile_map, &mut randomness, ruleset);
    climate::generate(&mut tile_map, &mut randomness, ruleset);
    hydrology::generate(&mut tile_map, &mut randomness, ruleset);
    features::spawn_vegetation(&mut tile_map, &mut randomness, ruleset);
    features::spawn_rare_features(&mut tile_map, &mut randomness, ruleset);
    features::spawn_ice(&mut tile_map, &mut randomness, ruleset);
    continents::assign_continents(&mut tile_map);
    rivers::generate(&mut tile_map, &mut randomness, ruleset);
    natural_wonders::generate(&mut tile_map, &mut randomness, ruleset);
    regions::generate(&mut tile_map, &mut randomness, ruleset);
    resources::generate(&mut tile_map, &mut randomness, ruleset);
    ruins::generate(&mut tile_map, &mut randomness, ruleset);

    info!(
        land_tiles = tile_map.land_tile_count(),
        continents = tile_map.continent_sizes.len(),
        starts = tile_map.starting_locations.len(),
        "map generation finished"
    );
    Ok(tile_map)
}
