//! Natural wonder placement. The wonder count scales with map radius; the
//! wonders themselves come from a weighted draw without replacement, placed
//! hardest-to-place first, each clearing a spacing zone around itself so
//! wonders never crowd one map corner.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::{
    constants::LAKES,
    map_generator::randomness::MapGenerationRandomness,
    ruleset::{Ruleset, terrain::Terrain, unique::UniqueType},
    tile_map::{NO_CONTINENT, TileMap, tile::Tile},
};

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    if tile_map.map_parameters.no_natural_wonders {
        return;
    }
    let radius = tile_map.map_parameters.map_size.radius();
    let count = (radius as f64 * 0.13133208 - 0.56128831).round() as i32;
    if count <= 0 {
        return;
    }
    let count = count as usize;
    let mut pool: Vec<Terrain> = ruleset.natural_wonders().cloned().collect();
    if pool.is_empty() {
        warn!("ruleset defines no natural wonders");
        return;
    }

    let continent_ranking = continents_by_size(tile_map);
    let mut chosen = Vec::with_capacity(count);
    while chosen.len() < count && !pool.is_empty() {
        chosen.push(weighted_draw(&mut pool, randomness));
    }

    let spacing = (tile_map.map_parameters.map_size.height / 5).max(1) as u32;
    let mut blocked = vec![false; tile_map.grid.size()];
    let mut placed = 0;
    for (wonder, candidates) in hardest_first(chosen, tile_map, &continent_ranking) {
        if try_place(
            &wonder,
            &candidates,
            tile_map,
            randomness,
            ruleset,
            &continent_ranking,
            &mut blocked,
            spacing,
        ) {
            placed += 1;
        }
    }

    // Shortfall pass: wonders the draw skipped get an exhaustive try, again
    // hardest first, ignoring their draw weights.
    if placed < count {
        for (wonder, candidates) in hardest_first(pool, tile_map, &continent_ranking) {
            if placed == count {
                break;
            }
            if try_place(
                &wonder,
                &candidates,
                tile_map,
                randomness,
                ruleset,
                &continent_ranking,
                &mut blocked,
                spacing,
            ) {
                placed += 1;
            }
        }
    }
    info!(placed, wanted = count, "placed natural wonders");
}

/// Continent ids sorted largest first; ties resolve to the lower id.
fn continents_by_size(tile_map: &TileMap) -> Vec<i32> {
    let mut ranking: Vec<(i32, u32)> = tile_map
        .continent_sizes
        .iter()
        .map(|(&id, &size)| (id, size))
        .collect();
    ranking.sort_by_key(|&(id, size)| (std::cmp::Reverse(size), id));
    ranking.into_iter().map(|(id, _)| id).collect()
}

fn weighted_draw(pool: &mut Vec<Terrain>, randomness: &mut MapGenerationRandomness) -> Terrain {
    let total: u32 = pool.iter().map(|wonder| wonder.weight.max(1)).sum();
    let mut roll = randomness.rng.random_range(0..total);
    for index in 0..pool.len() {
        let weight = pool[index].weight.max(1);
        if roll < weight {
            return pool.remove(index);
        }
        roll -= weight;
    }
    // Unreachable for a non-empty pool; keep the last entry as a safe fall-through.
    pool.remove(pool.len() - 1)
}

/// Wonders with the fewest candidate tiles get first pick of the map.
fn hardest_first(
    wonders: Vec<Terrain>,
    tile_map: &TileMap,
    continent_ranking: &[i32],
) -> Vec<(Terrain, Vec<Tile>)> {
    let mut attempts: Vec<(Terrain, Vec<Tile>)> = wonders
        .into_iter()
        .map(|wonder| {
            let candidates = candidate_tiles(&wonder, tile_map, continent_ranking);
            (wonder, candidates)
        })
        .collect();
    attempts.sort_by_key(|(_, candidates)| candidates.len());
    attempts
}

fn candidate_tiles(wonder: &Terrain, tile_map: &TileMap, continent_ranking: &[i32]) -> Vec<Tile> {
    tile_map
        .all_tiles()
        .filter(|tile| is_eligible(wonder, *tile, tile_map, continent_ranking))
        .collect()
}

fn is_eligible(
    wonder: &Terrain,
    tile: Tile,
    tile_map: &TileMap,
    continent_ranking: &[i32],
) -> bool {
    if tile.natural_wonder(tile_map).is_some()
        || !wonder.occurs_on(tile.last_terrain_name(tile_map))
    {
        return false;
    }
    for unique in &wonder.unique_objects {
        let satisfied = if unique.is(UniqueType::MustBeAdjacentToTiles) {
            matching_neighbors(tile, unique.param(1), tile_map) == unique.param_i32(0) as usize
        } else if unique.is(UniqueType::MustBeAdjacentToRangeTiles) {
            let matches = matching_neighbors(tile, unique.param(2), tile_map);
            (unique.param_i32(0) as usize..=unique.param_i32(1) as usize).contains(&matches)
        } else if unique.is(UniqueType::MustNotBeOnLargestLandmasses) {
            let top = unique.param_i32(0).max(0) as usize;
            !on_largest_landmasses(tile, top, tile_map, continent_ranking)
        } else if unique.is(UniqueType::MustBeOnLargestLandmasses) {
            let top = unique.param_i32(0).max(0) as usize;
            on_largest_landmasses(tile, top, tile_map, continent_ranking)
        } else if unique.is(UniqueType::OccursOnLatitudes) {
            let latitude = tile.latitude(tile_map) * 100.0;
            latitude >= unique.param_f64(0) && latitude <= unique.param_f64(1)
        } else {
            true
        };
        if !satisfied {
            return false;
        }
    }
    true
}

fn matching_neighbors(tile: Tile, terrain: &str, tile_map: &TileMap) -> usize {
    tile.neighbor_tiles(tile_map)
        .iter()
        .filter(|neighbor| {
            neighbor.base_terrain(tile_map) == terrain || neighbor.has_feature(terrain, tile_map)
        })
        .count()
}

fn on_largest_landmasses(
    tile: Tile,
    top: usize,
    tile_map: &TileMap,
    continent_ranking: &[i32],
) -> bool {
    let continent = tile.continent_id(tile_map);
    continent != NO_CONTINENT
        && continent_ranking
            .iter()
            .take(top)
            .any(|&id| id == continent)
}

#[allow(clippy::too_many_arguments)]
fn try_place(
    wonder: &Terrain,
    candidates: &[Tile],
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
    continent_ranking: &[i32],
    blocked: &mut [bool],
    spacing: u32,
) -> bool {
    // Earlier placements may have reshaped terrain, so re-check eligibility.
    let available: Vec<Tile> = candidates
        .iter()
        .copied()
        .filter(|tile| !blocked[tile.index()])
        .filter(|tile| is_eligible(wonder, *tile, tile_map, continent_ranking))
        .collect();
    let Some(&first) = available.choose(&mut randomness.rng) else {
        return false;
    };

    let mut group = vec![first];
    place_one(wonder, first, tile_map, ruleset);
    if let Some(unique) = wonder
        .matching_uniques(UniqueType::OccursInGroupsOfTiles)
        .next()
    {
        let low = unique.param_i32(0).max(1);
        let high = unique.param_i32(1).max(low);
        let target = randomness.rng.random_range(low..=high) as usize;
        while group.len() < target {
            let frontier: Vec<Tile> = group
                .iter()
                .flat_map(|tile| tile.neighbor_tiles(tile_map))
                .filter(|tile| {
                    !blocked[tile.index()]
                        && tile.natural_wonder(tile_map).is_none()
                        && wonder.occurs_on(tile.last_terrain_name(tile_map))
                })
                .collect();
            let Some(&next) = frontier.choose(&mut randomness.rng) else {
                break;
            };
            place_one(wonder, next, tile_map, ruleset);
            group.push(next);
        }
    }

    for tile in group {
        for nearby in tile.tiles_within_distance(spacing, tile_map) {
            blocked[nearby.index()] = true;
        }
    }
    true
}

fn place_one(wonder: &Terrain, tile: Tile, tile_map: &mut TileMap, ruleset: &Ruleset) {
    tile_map.clear_features(tile);
    tile_map.clear_resource(tile);
    if let Some(turns_into) = wonder
        .turns_into
        .as_ref()
        .and_then(|name| ruleset.terrain(name))
        .cloned()
    {
        tile_map.set_base_terrain(tile, &turns_into);
    }
    tile_map.set_natural_wonder(tile, wonder);
    convert_neighbors(wonder, tile, tile_map, ruleset);
}

fn convert_neighbors(wonder: &Terrain, tile: Tile, tile_map: &mut TileMap, ruleset: &Ruleset) {
    let conversions: Vec<(Option<String>, String)> = wonder
        .unique_objects
        .iter()
        .filter_map(|unique| {
            if unique.is(UniqueType::ConvertNeighbors) {
                Some((None, unique.param(0).to_owned()))
            } else if unique.is(UniqueType::ConvertNeighborsExcept) {
                Some((Some(unique.param(0).to_owned()), unique.param(1).to_owned()))
            } else {
                None
            }
        })
        .collect();
    for (except, target) in conversions {
        let Some(target) = ruleset.terrain(&target).cloned() else {
            continue;
        };
        for neighbor in tile.neighbor_tiles(tile_map) {
            if neighbor.natural_wonder(tile_map).is_some()
                || neighbor.base_terrain(tile_map) == LAKES
            {
                continue;
            }
            if let Some(except) = &except {
                if neighbor.base_terrain(tile_map) == *except
                    || neighbor.has_feature(except, tile_map)
                {
                    continue;
                }
            }
            tile_map.clear_features(neighbor);
            tile_map.set_base_terrain(neighbor, &target);
        }
    }
}
