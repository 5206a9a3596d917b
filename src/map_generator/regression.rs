//! Best-effort inverses for the editor's single-step mode. Every inverse is
//! lossy by design: regressing climate cannot recover the biome noise, and
//! lake or coast tiles revert to guessed defaults rather than their true
//! pre-stage terrain.

use crate::{
    constants::{COAST, LAKES},
    map_generator::MapGeneratorStep,
    ruleset::{Ruleset, unique::UniqueType},
    tile_map::{TileMap, tile::Tile},
};

pub fn regress_single_step(tile_map: &mut TileMap, ruleset: &Ruleset, step: MapGeneratorStep) {
    match step {
        MapGeneratorStep::Landmass => regress_landmass(tile_map, ruleset),
        MapGeneratorStep::Elevation => regress_elevation(tile_map, ruleset),
        MapGeneratorStep::HumidityAndTemperature => regress_climate(tile_map, ruleset),
        MapGeneratorStep::LakesAndCoast => regress_lakes_and_coast(tile_map, ruleset),
        MapGeneratorStep::Vegetation => {
            remove_features_with(tile_map, ruleset, UniqueType::Vegetation)
        }
        MapGeneratorStep::RareFeatures => {
            remove_features_with(tile_map, ruleset, UniqueType::RareFeature)
        }
        MapGeneratorStep::Ice => regress_ice(tile_map, ruleset),
        MapGeneratorStep::Continents => tile_map.reset_continents(),
        MapGeneratorStep::NaturalWonders => regress_natural_wonders(tile_map, ruleset),
        MapGeneratorStep::Rivers => tile_map.clear_all_rivers(),
        MapGeneratorStep::Resources => tile_map.clear_all_resources(),
        MapGeneratorStep::AncientRuins => regress_ruins(tile_map, ruleset),
    }
}

/// Back to the blank ocean the pipeline starts from.
fn regress_landmass(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let Some(water) = ruleset.first_water_terrain().cloned() else {
        return;
    };
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        tile_map.clear_features(tile);
        tile_map.clear_natural_wonder(tile);
        tile_map.clear_resource(tile);
        tile_map.clear_improvement(tile);
        tile_map.set_base_terrain(tile, &water);
    }
    tile_map.clear_all_rivers();
    tile_map.reset_continents();
    tile_map.starting_locations.clear();
}

/// Mountains flatten, hills disappear.
fn regress_elevation(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let Some(flat) = ruleset.first_land_terrain().cloned() else {
        return;
    };
    let hill_name = ruleset.hill_terrain().map(|t| t.name.clone());
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        if let Some(hill) = &hill_name {
            tile_map.remove_feature(tile, hill, ruleset);
        }
        let is_mountain = ruleset
            .terrain(tile.base_terrain(tile_map))
            .is_some_and(|t| t.has_unique(UniqueType::OccursInChains));
        if is_mountain {
            tile_map.set_base_terrain(tile, &flat);
        }
    }
}

/// Every biome reverts to the first land terrain. Mountains stay.
fn regress_climate(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let Some(flat) = ruleset.first_land_terrain().cloned() else {
        return;
    };
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        if !tile.is_land(tile_map) {
            continue;
        }
        let is_mountain = ruleset
            .terrain(tile.base_terrain(tile_map))
            .is_some_and(|t| t.has_unique(UniqueType::OccursInChains));
        if !is_mountain && tile.base_terrain(tile_map) != flat.name {
            tile_map.set_base_terrain(tile, &flat);
        }
    }
}

/// Lakes guess back to the first land terrain, coast deepens to ocean. The
/// true pre-stage terrain is gone.
fn regress_lakes_and_coast(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let (Some(land), Some(water)) = (
        ruleset.first_land_terrain().cloned(),
        ruleset.first_water_terrain().cloned(),
    ) else {
        return;
    };
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        match tile.base_terrain(tile_map) {
            LAKES => tile_map.set_base_terrain(tile, &land),
            COAST => tile_map.set_base_terrain(tile, &water),
            _ => {}
        }
    }
}

fn remove_features_with(tile_map: &mut TileMap, ruleset: &Ruleset, unique_type: UniqueType) {
    let names: Vec<String> = ruleset
        .features()
        .filter(|terrain| terrain.has_unique(unique_type))
        .map(|terrain| terrain.name.clone())
        .collect();
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        for name in &names {
            tile_map.remove_feature(tile, name, ruleset);
        }
    }
}

fn regress_ice(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let water_bases: Vec<&str> = ruleset
        .base_terrains()
        .filter(|terrain| terrain.is_water())
        .map(|terrain| terrain.name.as_str())
        .collect();
    let ice_names: Vec<String> = ruleset
        .features()
        .filter(|terrain| {
            terrain.impassable
                && !terrain.occurs_on.is_empty()
                && terrain
                    .occurs_on
                    .iter()
                    .all(|name| water_bases.contains(&name.as_str()))
        })
        .map(|terrain| terrain.name.clone())
        .collect();
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        for name in &ice_names {
            tile_map.remove_feature(tile, name, ruleset);
        }
    }
}

/// Removes each wonder and guesses the underlying terrain from the
/// neighborhood: the base terrain most of the neighbors share wins.
fn regress_natural_wonders(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let wonder_tiles: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.natural_wonder(tile_map).is_some())
        .collect();
    for tile in wonder_tiles {
        tile_map.clear_natural_wonder(tile);
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for neighbor in tile.neighbor_tiles(tile_map) {
            if neighbor.natural_wonder(tile_map).is_some() {
                continue;
            }
            let name = neighbor.base_terrain(tile_map);
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
        let majority = counts
            .iter()
            .fold(None, |best: Option<(&str, usize)>, &(name, count)| {
                match best {
                    Some((_, best_count)) if best_count >= count => best,
                    _ => Some((name, count)),
                }
            })
            .map(|(name, _)| name.to_owned());
        if let Some(terrain) = majority.as_deref().and_then(|name| ruleset.terrain(name)) {
            let terrain = terrain.clone();
            tile_map.set_base_terrain(tile, &terrain);
        }
    }
}

fn regress_ruins(tile_map: &mut TileMap, ruleset: &Ruleset) {
    let ruin_name = ruleset.ruin_improvement().map(|r| r.name.clone());
    let Some(ruin_name) = ruin_name else {
        return;
    };
    for tile in tile_map.all_tiles().collect::<Vec<_>>() {
        if tile.improvement(tile_map) == Some(ruin_name.as_str()) {
            tile_map.clear_improvement(tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{FOREST, GRASSLAND, MOUNTAIN, OCEAN},
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
    fn elevation_regression_flattens_everything() {
        let (mut tile_map, ruleset) = grassland_map(8, 8);
        let mountain = ruleset.terrain(MOUNTAIN).unwrap().clone();
        let hill = ruleset.hill_terrain().unwrap().clone();
        tile_map.set_base_terrain(Tile::new(3), &mountain);
        tile_map.add_feature(Tile::new(4), &hill);
        regress_single_step(&mut tile_map, &ruleset, MapGeneratorStep::Elevation);
        assert_eq!(Tile::new(3).base_terrain(&tile_map), GRASSLAND);
        assert!(!Tile::new(4).is_hill(&tile_map));
    }

    #[test]
    fn lake_regression_guesses_land() {
        let (mut tile_map, ruleset) = grassland_map(8, 8);
        let lakes = ruleset.terrain(LAKES).unwrap().clone();
        let coast = ruleset.terrain(COAST).unwrap().clone();
        tile_map.set_base_terrain(Tile::new(0), &lakes);
        tile_map.set_base_terrain(Tile::new(1), &coast);
        regress_single_step(&mut tile_map, &ruleset, MapGeneratorStep::LakesAndCoast);
        assert_eq!(Tile::new(0).base_terrain(&tile_map), GRASSLAND);
        assert_eq!(Tile::new(1).base_terrain(&tile_map), OCEAN);
    }

    #[test]
    fn vegetation_regression_strips_only_vegetation() {
        let (mut tile_map, ruleset) = grassland_map(8, 8);
        let forest = ruleset.terrain(FOREST).unwrap().clone();
        let marsh = ruleset.terrain("Marsh").unwrap().clone();
        let tile = Tile::new(5);
        tile_map.add_feature(tile, &marsh);
        tile_map.add_feature(tile, &forest);
        regress_single_step(&mut tile_map, &ruleset, MapGeneratorStep::Vegetation);
        assert!(!tile.has_feature(FOREST, &tile_map));
        assert!(tile.has_feature("Marsh", &tile_map));
    }

    #[test]
    fn wonder_regression_takes_the_neighborhood_majority() {
        let (mut tile_map, ruleset) = grassland_map(8, 8);
        let wonder = ruleset.terrain("Mount Fuji").unwrap().clone();
        let mountain = ruleset.terrain(MOUNTAIN).unwrap().clone();
        let tile = Tile::new(3 + 3 * 8);
        tile_map.set_base_terrain(tile, &mountain);
        tile_map.set_natural_wonder(tile, &wonder);
        regress_single_step(&mut tile_map, &ruleset, MapGeneratorStep::NaturalWonders);
        assert!(tile.natural_wonder(&tile_map).is_none());
        // All six neighbors are grassland, so the tile reverts to grassland.
        assert_eq!(tile.base_terrain(&tile_map), GRASSLAND);
        assert!(!tile.is_impassable(&tile_map));
    }

    #[test]
    fn landmass_regression_resets_to_ocean() {
        let (mut tile_map, ruleset) = grassland_map(8, 8);
        tile_map.set_resource(Tile::new(2), "Iron", 3);
        regress_single_step(&mut tile_map, &ruleset, MapGeneratorStep::Landmass);
        assert!(tile_map.all_tiles().all(|t| t.base_terrain(&tile_map) == OCEAN));
        assert!(tile_map.all_tiles().all(|t| t.resource(&tile_map).is_none()));
    }
}
