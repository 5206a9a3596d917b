//! Labels connected landmasses with continent ids. Water keeps the
//! no-continent sentinel. Ids are assigned in scan order, so the same map
//! always gets the same labels.

use std::collections::VecDeque;

use crate::tile_map::{NO_CONTINENT, TileMap, tile::Tile};

pub fn assign_continents(tile_map: &mut TileMap) {
    tile_map.reset_continents();
    let mut next_id = 0;
    let all_tiles: Vec<Tile> = tile_map.all_tiles().collect();
    for start in all_tiles {
        if start.is_water(tile_map) || start.continent_id(tile_map) != NO_CONTINENT {
            continue;
        }
        let id = next_id;
        next_id += 1;
        let mut size = 0u32;
        let mut queue = VecDeque::from([start]);
        tile_map.continent_id_list[start.index()] = id;
        while let Some(tile) = queue.pop_front() {
            size += 1;
            for neighbor in tile.neighbor_tiles(tile_map) {
                if neighbor.is_land(tile_map)
                    && neighbor.continent_id(tile_map) == NO_CONTINENT
                {
                    tile_map.continent_id_list[neighbor.index()] = id;
                    queue.push_back(neighbor);
                }
            }
        }
        tile_map.continent_sizes.insert(id, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::GRASSLAND,
        map_parameters::{MapParameters, MapSize},
        ruleset::Ruleset,
    };

    #[test]
    fn separated_islands_get_distinct_ids() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(10, 10);
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        // Two islands: a single tile and an L of three tiles, far apart.
        let lonely = Tile::new(1 + 1 * 10);
        let cluster = [Tile::new(7 + 7 * 10), Tile::new(8 + 7 * 10), Tile::new(7 + 8 * 10)];
        tile_map.set_base_terrain(lonely, &grassland);
        for tile in cluster {
            tile_map.set_base_terrain(tile, &grassland);
        }
        assign_continents(&mut tile_map);

        assert_ne!(lonely.continent_id(&tile_map), NO_CONTINENT);
        let cluster_id = cluster[0].continent_id(&tile_map);
        assert!(cluster.iter().all(|t| t.continent_id(&tile_map) == cluster_id));
        assert_ne!(lonely.continent_id(&tile_map), cluster_id);
        assert_eq!(tile_map.continent_sizes.len(), 2);
        assert_eq!(tile_map.continent_sizes[&cluster_id], 3);
        // Water stays unassigned.
        assert_eq!(Tile::new(0).continent_id(&tile_map), NO_CONTINENT);
    }

    #[test]
    fn reassignment_replaces_old_labels() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_size = MapSize::new(6, 6);
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let grassland = ruleset.terrain(GRASSLAND).unwrap().clone();
        tile_map.set_base_terrain(Tile::new(0), &grassland);
        assign_continents(&mut tile_map);
        assert_eq!(tile_map.continent_sizes.len(), 1);
        // Growing the island and re-running keeps a single continent.
        tile_map.set_base_terrain(Tile::new(1), &grassland);
        assign_continents(&mut tile_map);
        assert_eq!(tile_map.continent_sizes.len(), 1);
        assert_eq!(tile_map.continent_sizes[&0], 2);
    }
}
