//! Scatters ancient-ruin improvements across suitable land, one per fifty
//! suitable tiles, well separated.

use tracing::warn;

use crate::{
    map_generator::randomness::MapGenerationRandomness,
    ruleset::Ruleset,
    tile_map::{TileMap, tile::Tile},
};

/// One ruin per this many suitable tiles.
const TILES_PER_RUIN: usize = 50;

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    if tile_map.map_parameters.no_ruins {
        return;
    }
    let Some(ruin) = ruleset.ruin_improvement() else {
        warn!("ruleset has no ancient ruins improvement, skipping ruins");
        return;
    };
    let suitable: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| {
            tile.is_land(tile_map)
                && !tile.is_impassable(tile_map)
                && tile.improvement(tile_map).is_none()
                && (ruin.terrains_can_be_built_on.is_empty()
                    || ruin
                        .terrains_can_be_built_on
                        .iter()
                        .any(|name| name == tile.last_terrain_name(tile_map)))
        })
        .collect();
    let number = suitable.len() / TILES_PER_RUIN;
    if number == 0 {
        return;
    }
    let chosen = randomness.choose_spread_out_locations(
        number,
        &suitable,
        tile_map.map_parameters.map_size.radius(),
        tile_map,
    );
    let ruin_name = ruin.name.clone();
    for tile in chosen {
        tile_map.set_improvement(tile, &ruin_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::GRASSLAND,
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
    fn ruin_density_follows_suitable_land() {
        let (mut tile_map, ruleset) = grassland_map(20, 20);
        let mut randomness = MapGenerationRandomness::new(4);
        generate(&mut tile_map, &mut randomness, &ruleset);
        let ruins = tile_map
            .all_tiles()
            .filter(|t| t.improvement(&tile_map).is_some())
            .count();
        assert_eq!(ruins, 400 / TILES_PER_RUIN);
        for tile in tile_map.all_tiles() {
            if tile.improvement(&tile_map).is_some() {
                assert!(tile.is_land(&tile_map));
            }
        }
    }

    #[test]
    fn no_ruins_flag_is_honored() {
        let (mut tile_map, ruleset) = grassland_map(20, 20);
        tile_map.map_parameters.no_ruins = true;
        let mut randomness = MapGenerationRandomness::new(4);
        generate(&mut tile_map, &mut randomness, &ruleset);
        assert!(tile_map.all_tiles().all(|t| t.improvement(&tile_map).is_none()));
    }

    #[test]
    fn an_all_water_map_gets_no_ruins() {
        let ruleset = Ruleset::vanilla();
        let parameters = MapParameters::default();
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(4);
        generate(&mut tile_map, &mut randomness, &ruleset);
        assert!(tile_map.all_tiles().all(|t| t.improvement(&tile_map).is_none()));
    }
}
