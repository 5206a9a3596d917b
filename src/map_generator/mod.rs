//! The generation pipeline: one module per stage, run in a fixed order by
//! [`crate::generate_map`], plus the single-step entry points the map editor
//! uses to re-run or regress one stage in isolation.

pub mod climate;
pub mod continents;
pub mod elevation;
pub mod features;
pub mod hydrology;
pub mod landmass;
pub mod natural_wonders;
pub mod perlin;
pub mod randomness;
pub mod regions;
pub mod regression;
pub mod resources;
pub mod rivers;
pub mod ruins;

use crate::{
    MapGenerationError, map_generator::randomness::MapGenerationRandomness, ruleset::Ruleset,
    tile_map::TileMap,
};

/// The stages the map editor can run or regress individually. Region
/// balancing and start placement are not re-runnable in isolation; they
/// belong to full generation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapGeneratorStep {
    Landmass,
    Elevation,
    HumidityAndTemperature,
    LakesAndCoast,
    Vegetation,
    RareFeatures,
    Ice,
    Continents,
    NaturalWonders,
    Rivers,
    Resources,
    AncientRuins,
}

/// Runs exactly one stage forward against the current map state.
pub fn generate_single_step(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
    step: MapGeneratorStep,
) -> Result<(), MapGenerationError> {
    match step {
        MapGeneratorStep::Landmass => landmass::generate(tile_map, randomness, ruleset)?,
        MapGeneratorStep::Elevation => elevation::generate(tile_map, randomness, ruleset),
        MapGeneratorStep::HumidityAndTemperature => {
            climate::generate(tile_map, randomness, ruleset)
        }
        MapGeneratorStep::LakesAndCoast => hydrology::generate(tile_map, randomness, ruleset),
        MapGeneratorStep::Vegetation => features::spawn_vegetation(tile_map, randomness, ruleset),
        MapGeneratorStep::RareFeatures => {
            features::spawn_rare_features(tile_map, randomness, ruleset)
        }
        MapGeneratorStep::Ice => features::spawn_ice(tile_map, randomness, ruleset),
        MapGeneratorStep::Continents => continents::assign_continents(tile_map),
        MapGeneratorStep::NaturalWonders => {
            natural_wonders::generate(tile_map, randomness, ruleset)
        }
        MapGeneratorStep::Rivers => rivers::generate(tile_map, randomness, ruleset),
        MapGeneratorStep::Resources => resources::generate(tile_map, randomness, ruleset),
        MapGeneratorStep::AncientRuins => ruins::generate(tile_map, randomness, ruleset),
    }
    Ok(())
}

/// Applies the lossy inverse of one stage. See [`regression`] for the
/// per-stage semantics.
pub fn regress_single_step(tile_map: &mut TileMap, ruleset: &Ruleset, step: MapGeneratorStep) {
    regression::regress_single_step(tile_map, ruleset, step);
}
