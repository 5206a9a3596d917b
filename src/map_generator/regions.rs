//! Region balancing and start placement. Land is carved into one region per
//! major civilization by recursive fertility splitting, each region is
//! classified by its dominant terrain, a start tile is chosen by a scored
//! three-ring evaluation, and civilizations claim regions according to their
//! start biases. City-states settle the gaps afterwards.

use enum_map::{Enum, EnumMap};
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::{
    constants::LAKES,
    grid::offset_coordinate::Rectangle,
    map_generator::randomness::MapGenerationRandomness,
    ruleset::{
        Ruleset, nation::Nation, terrain::Terrain, tile_resource::ResourceType,
        unique::UniqueType,
    },
    tile_map::{NO_CONTINENT, TileMap, tile::Tile},
};

/// Ring-1 food count to score. Indexed by count, saturating at the end.
const RING1_FOOD_SCORE: [i32; 7] = [0, 8, 14, 19, 22, 24, 25];
const RING1_PROD_SCORE: [i32; 7] = [0, 10, 16, 20, 20, 12, 0];
const RING2_FOOD_SCORE: [i32; 11] = [0, 2, 5, 10, 20, 25, 28, 30, 32, 34, 35];
const RING2_PROD_SCORE: [i32; 6] = [0, 10, 20, 25, 30, 35];

/// Cumulative minimums a "good" start must reach after rings 1, 2, 3.
const MIN_FOOD: [usize; 3] = [1, 4, 4];
const MIN_PROD: [usize; 3] = [0, 0, 2];
const MIN_GOOD: [usize; 3] = [3, 6, 8];
const MAX_JUNK: usize = 9;

/// Penalty rings around a placed start, by distance from it.
const CLOSE_START_PENALTIES: [(u32, u32); 9] = [
    (0, 99),
    (1, 97),
    (2, 95),
    (3, 92),
    (4, 89),
    (5, 69),
    (6, 57),
    (7, 24),
    (8, 15),
];

const DEFAULT_REGION_TYPE: &str = "Hybrid";

/// One civilization's slice of the map. Created by recursive splitting and
/// consumed when a civilization claims it.
#[derive(Debug, Clone)]
pub struct Region {
    pub tiles: Vec<Tile>,
    pub rect: Rectangle,
    pub continent_id: i32,
    pub total_fertility: i32,
    /// Terrain name -> count, in first-seen order.
    pub terrain_counts: Vec<(String, u32)>,
    pub region_type: String,
    pub start_tile: Option<Tile>,
    pub assigned: bool,
}

impl Region {
    fn from_tiles(tiles: Vec<Tile>, continent_id: i32, tile_map: &TileMap, ruleset: &Ruleset) -> Self {
        let total_fertility = tiles
            .iter()
            .map(|tile| tile.fertility(true, tile_map, ruleset))
            .sum();
        let rect = bounding_rect(&tiles, tile_map);
        Self {
            tiles,
            rect,
            continent_id,
            total_fertility,
            terrain_counts: Vec::new(),
            region_type: DEFAULT_REGION_TYPE.to_owned(),
            start_tile: None,
            assigned: false,
        }
    }

    pub fn terrain_count(&self, name: &str) -> u32 {
        self.terrain_counts
            .iter()
            .find(|(terrain, _)| terrain == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Start-evaluation scratch, one per tile, alive only for this stage.
#[derive(Debug, Clone, Default)]
struct MapGenTileData {
    close_start_penalty: u32,
    qualities: EnumMap<TileQuality, bool>,
    two_from_coast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
enum TileQuality {
    Food,
    Production,
    Good,
    Junk,
}

impl TileQuality {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Food" => Some(TileQuality::Food),
            "Production" => Some(TileQuality::Production),
            "Good" => Some(TileQuality::Good),
            "Junk" => Some(TileQuality::Junk),
            _ => None,
        }
    }
}

pub fn generate(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
) {
    let majors: Vec<Nation> = ruleset
        .nations
        .iter()
        .filter(|nation| nation.is_major_civ())
        .take(tile_map.map_parameters.num_civilizations as usize)
        .cloned()
        .collect();
    if majors.len() < tile_map.map_parameters.num_civilizations as usize {
        warn!(
            wanted = tile_map.map_parameters.num_civilizations,
            available = majors.len(),
            "fewer major nations than requested civilizations"
        );
    }

    let mut tile_data = vec![MapGenTileData::default(); tile_map.grid.size()];
    if !majors.is_empty() {
        let mut regions = divide_into_regions(majors.len(), tile_map, ruleset);
        for (index, region) in regions.iter_mut().enumerate() {
            update_terrain_counts(region, tile_map, ruleset);
            determine_region_type(region, ruleset);
            for tile in &region.tiles {
                tile_map.region_id_list[tile.index()] = index as i32;
            }
        }
        info!(regions = regions.len(), "divided the map into regions");

        initialize_tile_data(&mut tile_data, &regions, tile_map, ruleset);
        for index in fertility_ascending(&regions) {
            find_start(index, &mut regions, tile_map, ruleset, &mut tile_data);
            if let Some(start) = regions[index].start_tile {
                normalize_start(start, tile_map, randomness, ruleset, &tile_data);
            }
        }
        assign_civilizations(&majors, &mut regions, tile_map, randomness);
    }
    place_city_states(tile_map, randomness, ruleset, &tile_data);
}

/// Weak regions search first, so they get first pick of their own tiles
/// before richer neighbors lay down close-start penalties. Ties keep the
/// creation order.
fn fertility_ascending(regions: &[Region]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..regions.len()).collect();
    order.sort_by_key(|&index| regions[index].total_fertility);
    order
}

fn bounding_rect(tiles: &[Tile], tile_map: &TileMap) -> Rectangle {
    let mut coordinates = tiles.iter().map(|tile| tile.offset_coordinate(tile_map));
    let Some(first) = coordinates.next() else {
        return Rectangle::new(0, 0, 0, 0);
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for coordinate in coordinates {
        min_x = min_x.min(coordinate.x);
        max_x = max_x.max(coordinate.x);
        min_y = min_y.min(coordinate.y);
        max_y = max_y.max(coordinate.y);
    }
    Rectangle::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// One region per civilization. Continents are respected unless the largest
/// one holds less than a quarter of all land, in which case the whole map is
/// treated as a single landmass.
fn divide_into_regions(civ_count: usize, tile_map: &TileMap, ruleset: &Ruleset) -> Vec<Region> {
    let land: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| tile.is_land(tile_map))
        .collect();
    let largest_continent = tile_map
        .continent_sizes
        .values()
        .max()
        .copied()
        .unwrap_or(0) as f64;

    if largest_continent < land.len() as f64 * 0.25 {
        let whole_map = Region::from_tiles(land, NO_CONTINENT, tile_map, ruleset);
        return split_into(whole_map, civ_count, tile_map, ruleset);
    }

    // Greedy spread: each civilization goes to the continent with the best
    // remaining fertility per civilization already there.
    let mut continent_fertility: std::collections::BTreeMap<i32, i32> =
        std::collections::BTreeMap::new();
    for tile in &land {
        *continent_fertility
            .entry(tile.continent_id(tile_map))
            .or_insert(0) += tile.fertility(true, tile_map, ruleset);
    }
    let mut civs_on_continent: std::collections::BTreeMap<i32, usize> = continent_fertility
        .keys()
        .map(|&id| (id, 0))
        .collect();
    for _ in 0..civ_count {
        let best = continent_fertility
            .iter()
            .map(|(&id, &fertility)| {
                (id, fertility as f64 / (1 + civs_on_continent[&id]) as f64)
            })
            .fold(None, |best: Option<(i32, f64)>, (id, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((id, value)),
            });
        if let Some((id, _)) = best {
            if let Some(count) = civs_on_continent.get_mut(&id) {
                *count += 1;
            }
        }
    }

    let mut regions = Vec::with_capacity(civ_count);
    for (&continent, &civs) in &civs_on_continent {
        if civs == 0 {
            continue;
        }
        let tiles: Vec<Tile> = land
            .iter()
            .copied()
            .filter(|tile| tile.continent_id(tile_map) == continent)
            .collect();
        let region = Region::from_tiles(tiles, continent, tile_map, ruleset);
        regions.extend(split_into(region, civs, tile_map, ruleset));
    }
    regions
}

fn split_into(region: Region, parts: usize, tile_map: &TileMap, ruleset: &Ruleset) -> Vec<Region> {
    if parts <= 1 {
        return vec![region];
    }
    let first = parts / 2;
    let (a, b) = split_region(region, first as f64 / parts as f64, tile_map, ruleset);
    let mut result = split_into(a, first, tile_map, ruleset);
    result.extend(split_into(b, parts - first, tile_map, ruleset));
    result
}

/// Cuts the region across its longer axis at the line whose cumulative
/// fertility comes closest to the requested fraction. Equal misses keep the
/// later cut.
fn split_region(
    region: Region,
    fraction: f64,
    tile_map: &TileMap,
    ruleset: &Ruleset,
) -> (Region, Region) {
    let target = (region.total_fertility as f64 * fraction).round() as i32;
    let split_columns = region.rect.width >= region.rect.height;
    let lines = if split_columns {
        region.rect.width
    } else {
        region.rect.height
    }
    .max(1) as usize;

    let line_of = |tile: &Tile| -> usize {
        let coordinate = tile.offset_coordinate(tile_map);
        if split_columns {
            (coordinate.x - region.rect.x) as usize
        } else {
            (coordinate.y - region.rect.y) as usize
        }
    };
    let mut line_fertility = vec![0i32; lines];
    for tile in &region.tiles {
        line_fertility[line_of(tile)] += tile.fertility(true, tile_map, ruleset);
    }

    let mut best_cut = 1;
    let mut best_diff = i32::MAX;
    let mut cumulative = 0;
    for line in 0..lines.saturating_sub(1) {
        cumulative += line_fertility[line];
        let diff = (cumulative - target).abs();
        if diff <= best_diff {
            best_diff = diff;
            best_cut = line + 1;
        }
    }

    let (mut a_tiles, mut b_tiles): (Vec<Tile>, Vec<Tile>) = region
        .tiles
        .iter()
        .copied()
        .partition(|tile| line_of(tile) < best_cut);
    if a_tiles.is_empty() || b_tiles.is_empty() {
        // Degenerate shapes (single-line rects) fall back to an index split.
        let mut all = region.tiles.clone();
        all.sort_unstable();
        let half = all.len() / 2;
        b_tiles = all.split_off(half);
        a_tiles = all;
    }
    (
        Region::from_tiles(a_tiles, region.continent_id, tile_map, ruleset),
        Region::from_tiles(b_tiles, region.continent_id, tile_map, ruleset),
    )
}

fn update_terrain_counts(region: &mut Region, tile_map: &TileMap, ruleset: &Ruleset) {
    let mut counts: Vec<(String, u32)> = Vec::new();
    let mut bump = |counts: &mut Vec<(String, u32)>, name: &str| {
        match counts.iter_mut().find(|(terrain, _)| terrain == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.to_owned(), 1)),
        }
    };
    for tile in &region.tiles {
        let ignore_base = tile
            .terrains(tile_map, ruleset)
            .any(|terrain| terrain.has_unique(UniqueType::IgnoreBaseTerrainForRegion));
        if !ignore_base {
            bump(&mut counts, tile.base_terrain(tile_map));
        }
        for feature in tile.features(tile_map) {
            bump(&mut counts, feature);
        }
    }
    region.terrain_counts = counts;
}

/// Region-type candidates are tried in ascending priority; the first one
/// whose percentage rule holds (and whose exclusion rules don't) names the
/// region. No match means a hybrid region.
fn determine_region_type(region: &mut Region, ruleset: &Ruleset) {
    let total = region.tiles.len() as u32;
    if total == 0 {
        region.region_type = DEFAULT_REGION_TYPE.to_owned();
        return;
    }
    let mut candidates: Vec<&Terrain> = ruleset
        .terrains
        .iter()
        .filter(|terrain| terrain.has_unique(UniqueType::RegionWithPriority))
        .collect();
    candidates.sort_by_key(|terrain| {
        terrain
            .matching_uniques(UniqueType::RegionWithPriority)
            .next()
            .map(|unique| unique.param_i32(0))
            .unwrap_or(i32::MAX)
    });

    'candidates: for terrain in candidates {
        for unique in terrain.matching_uniques(UniqueType::RegionRequireFirstLessThanSecond) {
            if region.terrain_count(unique.param(0)) > region.terrain_count(unique.param(1)) {
                continue 'candidates;
            }
        }
        let single = terrain
            .matching_uniques(UniqueType::RegionRequirePercentSingleType)
            .any(|unique| {
                region.terrain_count(unique.param(1)) * 100
                    >= unique.param_i32(0).max(0) as u32 * total
            });
        let paired = terrain
            .matching_uniques(UniqueType::RegionRequirePercentTwoTypes)
            .any(|unique| {
                (region.terrain_count(unique.param(1)) + region.terrain_count(unique.param(2)))
                    * 100
                    >= unique.param_i32(0).max(0) as u32 * total
            });
        if single || paired {
            region.region_type = terrain.name.clone();
            return;
        }
    }
    region.region_type = DEFAULT_REGION_TYPE.to_owned();
}

/// Fills the per-tile quality flags. A tile's qualities depend on the type
/// of the region it sits in; tiles outside every region evaluate against no
/// region type.
fn initialize_tile_data(
    tile_data: &mut [MapGenTileData],
    regions: &[Region],
    tile_map: &TileMap,
    ruleset: &Ruleset,
) {
    let mut region_type_of: Vec<Option<usize>> = vec![None; tile_map.grid.size()];
    for (index, region) in regions.iter().enumerate() {
        for tile in &region.tiles {
            region_type_of[tile.index()] = Some(index);
        }
    }
    for tile in tile_map.all_tiles() {
        let region_type = region_type_of[tile.index()]
            .map(|index| regions[index].region_type.as_str())
            .unwrap_or("");
        let data = &mut tile_data[tile.index()];
        data.qualities = tile_qualities(tile, region_type, tile_map, ruleset);
        data.two_from_coast = !tile.is_coastal_tile(tile_map)
            && tile.is_land(tile_map)
            && tile
                .tiles_at_distance(2, tile_map)
                .iter()
                .any(|other| other.is_water(tile_map));
    }
}

fn tile_qualities(
    tile: Tile,
    region_type: &str,
    tile_map: &TileMap,
    ruleset: &Ruleset,
) -> EnumMap<TileQuality, bool> {
    let mut qualities = EnumMap::default();
    for terrain in tile.terrains(tile_map, ruleset) {
        for unique in &terrain.unique_objects {
            let quality = if unique.is(UniqueType::StartQuality) {
                Some(unique.param(0))
            } else if unique.is(UniqueType::StartQualityInRegion)
                && unique.param(1) == region_type
            {
                Some(unique.param(0))
            } else if unique.is(UniqueType::StartQualityExceptRegion)
                && unique.param(1) != region_type
            {
                Some(unique.param(0))
            } else {
                None
            };
            if let Some(quality) = quality.and_then(TileQuality::from_name) {
                qualities[quality] = true;
            }
        }
    }
    qualities
}

/// Scores a candidate start by its three surrounding rings and decides
/// whether it clears the "good start" minimums.
fn evaluate_tile_for_start(
    tile: Tile,
    tile_map: &TileMap,
    tile_data: &[MapGenTileData],
) -> (i32, bool) {
    let mut score = 0;
    let mut good_start = true;
    let (mut total_food, mut total_prod, mut total_good, mut total_junk) = (0, 0, 0, 0);

    for ring in 1..=3u32 {
        let (mut food, mut prod, mut good, mut junk, mut rivers) = (0usize, 0, 0, 0, 0);
        for other in tile.tiles_at_distance(ring, tile_map) {
            let qualities = &tile_data[other.index()].qualities;
            // A junk tile contributes nothing else, whatever it also claims.
            if qualities[TileQuality::Junk] {
                junk += 1;
            } else {
                if qualities[TileQuality::Food] {
                    food += 1;
                }
                if qualities[TileQuality::Production] {
                    prod += 1;
                }
                if qualities[TileQuality::Good] {
                    good += 1;
                }
            }
            if other.is_adjacent_to_river(tile_map) {
                rivers += 1;
            }
        }
        total_food += food;
        total_prod += prod;
        total_good += good;
        total_junk += junk;

        score += match ring {
            1 => {
                RING1_FOOD_SCORE[food.min(6)] + RING1_PROD_SCORE[prod.min(6)]
                    + rivers as i32
                    + good as i32 * 2
                    - junk as i32 * 3
            }
            2 => {
                let food_score = if food > 10 {
                    35
                } else {
                    RING2_FOOD_SCORE[food]
                };
                // Production only counts fully once it keeps pace with food.
                let effective_prod = if prod >= food * 2 { prod } else { (food + 1) / 2 };
                let prod_score = if effective_prod > 5 {
                    35
                } else {
                    RING2_PROD_SCORE[effective_prod]
                };
                food_score + prod_score + rivers as i32 + good as i32 * 2 - junk as i32 * 3
            }
            _ => (food + prod + good + rivers) as i32 - junk as i32 * 2,
        };

        let index = (ring - 1) as usize;
        if total_food < MIN_FOOD[index]
            || total_prod < MIN_PROD[index]
            || total_good < MIN_GOOD[index]
        {
            good_start = false;
        }
    }
    if total_junk > MAX_JUNK {
        good_start = false;
    }
    if tile.is_coastal_tile(tile_map) {
        score += 40;
    }
    let penalty = tile_data[tile.index()].close_start_penalty;
    if penalty > 0 {
        score -= score * penalty as i32 / 100;
        good_start = false;
    }
    (score, good_start)
}

/// Picks a start tile for one region: central tiles first, then the middle
/// donut, then the fringe; river tiles before coastal ones before dry ones.
/// Falls back to the best-scoring tile, and in the degenerate all-water case
/// forces a land tile into existence rather than failing the whole run.
fn find_start(
    region_index: usize,
    regions: &mut [Region],
    tile_map: &mut TileMap,
    ruleset: &Ruleset,
    tile_data: &mut [MapGenTileData],
) {
    let region = &regions[region_index];
    let center_rect = region.rect.central(0.33);
    let middle_rect = region.rect.central(0.67);

    // Zone 0 center, 1 middle donut, 2 outer; tier 0 river, 1 water-adjacent,
    // 2 dry. Groups are tried in (zone, tier) order.
    let mut groups: [[Vec<Tile>; 3]; 3] = Default::default();
    for &tile in &region.tiles {
        if tile.is_impassable(tile_map) {
            continue;
        }
        let coordinate = tile.offset_coordinate(tile_map);
        let zone = if center_rect.contains(coordinate) {
            0
        } else if middle_rect.contains(coordinate) {
            1
        } else {
            2
        };
        if zone < 2 && tile_data[tile.index()].two_from_coast {
            continue;
        }
        let tier = if tile.is_adjacent_to_river(tile_map) {
            0
        } else if tile.is_coastal_tile(tile_map)
            || tile.is_adjacent_to_fresh_water(tile_map, ruleset)
        {
            1
        } else {
            2
        };
        groups[zone][tier].push(tile);
    }

    let mut fallback: Option<(Tile, i32)> = None;
    let mut chosen: Option<Tile> = None;
    'search: for zone in &groups {
        for tier in zone {
            let mut best_good: Option<(Tile, i32)> = None;
            for &tile in tier {
                let (score, good) = evaluate_tile_for_start(tile, tile_map, tile_data);
                if fallback.is_none_or(|(_, best)| score > best) {
                    fallback = Some((tile, score));
                }
                if good && best_good.is_none_or(|(_, best)| score > best) {
                    best_good = Some((tile, score));
                }
            }
            if let Some((tile, _)) = best_good {
                chosen = Some(tile);
                break 'search;
            }
        }
    }

    let start = chosen.or(fallback.map(|(tile, _)| tile)).unwrap_or_else(|| {
        // No usable tile at all. Force land at the region's corner so every
        // region still produces a start.
        let tile = tile_map
            .tiles_in_rectangle(&regions[region_index].rect)
            .next()
            .unwrap_or_else(|| Tile::new(tile_map.grid.center_tile()));
        tile
    });
    if start.is_water(tile_map) || start.is_impassable(tile_map) {
        if let Some(land) = ruleset.first_land_terrain() {
            tile_map.clear_features(start);
            tile_map.clear_natural_wonder(start);
            tile_map.set_base_terrain(start, land);
        }
    }
    regions[region_index].start_tile = Some(start);
    add_close_start_penalty(start, tile_map, tile_data);
}

fn add_close_start_penalty(start: Tile, tile_map: &TileMap, tile_data: &mut [MapGenTileData]) {
    for (distance, penalty) in CLOSE_START_PENALTIES {
        let ring = if distance == 0 {
            vec![start]
        } else {
            start.tiles_at_distance(distance, tile_map)
        };
        for tile in ring {
            let data = &mut tile_data[tile.index()];
            data.close_start_penalty = if data.close_start_penalty == 0 {
                penalty
            } else {
                ((data.close_start_penalty.max(penalty) as f64 * 1.2) as u32).min(97)
            };
        }
    }
}

/// Touches up a freshly chosen start: melts ice off the adjacent water,
/// raises a hill when the first ring offers no production at all, and
/// guarantees one strategic deposit within working distance.
fn normalize_start(
    start: Tile,
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
    tile_data: &[MapGenTileData],
) {
    for neighbor in start.neighbor_tiles(tile_map) {
        let frozen: Vec<String> = neighbor
            .features(tile_map)
            .iter()
            .filter(|name| ruleset.terrain(name).is_some_and(|t| t.impassable))
            .cloned()
            .collect();
        for feature in frozen {
            tile_map.remove_feature(neighbor, &feature, ruleset);
        }
    }

    let ring1 = start.tiles_at_distance(1, tile_map);
    if let Some(hill) = ruleset.hill_terrain() {
        let production = ring1
            .iter()
            .filter(|tile| tile_data[tile.index()].qualities[TileQuality::Production])
            .count();
        if production == 0 {
            let eligible: Vec<Tile> = ring1
                .iter()
                .copied()
                .filter(|tile| {
                    tile.is_land(tile_map)
                        && !tile.is_impassable(tile_map)
                        && tile.features(tile_map).is_empty()
                        && hill.occurs_on(tile.base_terrain(tile_map))
                })
                .collect();
            if let Some(&tile) = eligible.choose(&mut randomness.rng) {
                tile_map.add_feature(tile, hill);
            }
        }
    }

    let nearby = start.tiles_within_distance(2, tile_map);
    let has_strategic = nearby.iter().any(|tile| {
        tile.resource(tile_map).is_some_and(|(name, _)| {
            ruleset
                .resource(name)
                .is_some_and(|r| r.resource_type == ResourceType::Strategic)
        })
    });
    if has_strategic {
        return;
    }
    for resource in ruleset
        .tile_resources
        .iter()
        .filter(|r| r.resource_type == ResourceType::Strategic)
    {
        let spots: Vec<Tile> = nearby
            .iter()
            .copied()
            .filter(|tile| {
                tile.resource(tile_map).is_none()
                    && tile.natural_wonder(tile_map).is_none()
                    && !tile.is_impassable(tile_map)
                    && resource.can_be_found_on(tile.terrain_names(tile_map))
            })
            .collect();
        if let Some(&tile) = spots.choose(&mut randomness.rng) {
            tile_map.set_resource(tile, &resource.name, 2);
            return;
        }
    }
}

/// Civilizations claim regions by bias: coastal civs first, then positive
/// terrain biases (fewest biases first), then avoidance biases (most
/// avoidances first), then everyone else at random.
fn assign_civilizations(
    majors: &[Nation],
    regions: &mut [Region],
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
) {
    let mut pool: Vec<usize> = (0..regions.len())
        .filter(|&index| regions[index].start_tile.is_some())
        .collect();

    let mut coastal: Vec<&Nation> = Vec::new();
    let mut positive: Vec<&Nation> = Vec::new();
    let mut negative: Vec<&Nation> = Vec::new();
    let mut rest: Vec<&Nation> = Vec::new();
    for nation in majors {
        if nation.wants_coast() {
            coastal.push(nation);
        } else if !nation.preferred_region_types().is_empty() {
            positive.push(nation);
        } else if !nation.avoided_region_types().is_empty() {
            negative.push(nation);
        } else {
            rest.push(nation);
        }
    }
    positive.sort_by_key(|nation| nation.preferred_region_types().len());
    negative.sort_by_key(|nation| std::cmp::Reverse(nation.avoided_region_types().len()));

    let claim = |nation: &Nation,
                     region_index: usize,
                     pool: &mut Vec<usize>,
                     regions: &mut [Region],
                     tile_map: &mut TileMap| {
        pool.retain(|&index| index != region_index);
        regions[region_index].assigned = true;
        if let Some(start) = regions[region_index].start_tile {
            tile_map.add_starting_location(&nation.name, start);
        }
    };

    for nation in coastal {
        if pool.is_empty() {
            break;
        }
        let tiers: [Box<dyn Fn(&Region, &TileMap) -> bool>; 4] = [
            Box::new(|region, map| {
                region
                    .start_tile
                    .is_some_and(|start| start.is_coastal_tile(map))
            }),
            Box::new(|region, map| {
                region.start_tile.is_some_and(|start| {
                    start
                        .neighbor_tiles(map)
                        .iter()
                        .any(|n| n.base_terrain(map) == LAKES)
                })
            }),
            Box::new(|region, map| {
                region
                    .start_tile
                    .is_some_and(|start| start.is_adjacent_to_river(map))
            }),
            Box::new(|region, map| {
                region.start_tile.is_some_and(|start| {
                    start
                        .tiles_within_distance(2, map)
                        .iter()
                        .any(|t| t.is_adjacent_to_river(map))
                })
            }),
        ];
        let mut picked = None;
        for tier in &tiers {
            let matching: Vec<usize> = pool
                .iter()
                .copied()
                .filter(|&index| tier(&regions[index], tile_map))
                .collect();
            if let Some(&index) = matching.choose(&mut randomness.rng) {
                picked = Some(index);
                break;
            }
        }
        let index = picked
            .or_else(|| pool.choose(&mut randomness.rng).copied());
        if let Some(index) = index {
            claim(nation, index, &mut pool, regions, tile_map);
        }
    }

    for nation in positive {
        if pool.is_empty() {
            break;
        }
        let preferred = nation.preferred_region_types();
        let matching: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&index| preferred.contains(&regions[index].region_type.as_str()))
            .collect();
        let index = if let Some(&index) = matching.choose(&mut randomness.rng) {
            Some(index)
        } else if preferred.len() == 1 {
            // Single-bias civs settle for the region richest in that terrain.
            pool.iter()
                .copied()
                .fold(None, |best: Option<(usize, u32)>, index| {
                    let count = regions[index].terrain_count(preferred[0]);
                    match best {
                        Some((_, best_count)) if best_count >= count => best,
                        _ => Some((index, count)),
                    }
                })
                .map(|(index, _)| index)
        } else {
            pool.choose(&mut randomness.rng).copied()
        };
        if let Some(index) = index {
            claim(nation, index, &mut pool, regions, tile_map);
        }
    }

    for nation in negative {
        if pool.is_empty() {
            break;
        }
        let avoided = nation.avoided_region_types();
        let acceptable: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&index| !avoided.contains(&regions[index].region_type.as_str()))
            .collect();
        let index = acceptable
            .choose(&mut randomness.rng)
            .copied()
            .or_else(|| pool.choose(&mut randomness.rng).copied());
        if let Some(index) = index {
            claim(nation, index, &mut pool, regions, tile_map);
        }
    }

    for nation in rest {
        let Some(&index) = pool.choose(&mut randomness.rng) else {
            break;
        };
        claim(nation, index, &mut pool, regions, tile_map);
    }
}

/// City-states take well-separated land tiles outside every major civ's
/// close-start penalty zone.
fn place_city_states(
    tile_map: &mut TileMap,
    randomness: &mut MapGenerationRandomness,
    ruleset: &Ruleset,
    tile_data: &[MapGenTileData],
) {
    let city_states: Vec<Nation> = ruleset
        .nations
        .iter()
        .filter(|nation| nation.is_city_state())
        .take(tile_map.map_parameters.num_city_states as usize)
        .cloned()
        .collect();
    if city_states.is_empty() {
        return;
    }
    let candidates: Vec<Tile> = tile_map
        .all_tiles()
        .filter(|tile| {
            tile.is_land(tile_map)
                && !tile.is_impassable(tile_map)
                && tile.natural_wonder(tile_map).is_none()
                && tile_data[tile.index()].close_start_penalty == 0
        })
        .collect();
    let chosen = randomness.choose_spread_out_locations(
        city_states.len(),
        &candidates,
        tile_map.map_parameters.map_size.radius(),
        tile_map,
    );
    for (nation, tile) in city_states.iter().zip(chosen) {
        tile_map.add_starting_location(&nation.name, tile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{GRASSLAND, ICE, OCEAN, SNOW, TUNDRA},
        map_generator::{continents, elevation, landmass},
        map_parameters::{MapParameters, MapSize, MapType},
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
        continents::assign_continents(&mut tile_map);
        (tile_map, ruleset)
    }

    #[test]
    fn splitting_partitions_the_land() {
        let (tile_map, ruleset) = grassland_map(16, 16);
        let regions = divide_into_regions(4, &tile_map, &ruleset);
        assert_eq!(regions.len(), 4);
        let total: usize = regions.iter().map(|r| r.tiles.len()).sum();
        assert_eq!(total, 16 * 16);
        // Tiles are disjoint across regions.
        let mut seen = vec![false; 16 * 16];
        for region in &regions {
            for tile in &region.tiles {
                assert!(!seen[tile.index()], "tile in two regions");
                seen[tile.index()] = true;
            }
        }
        // On uniform land the fertility split is near even.
        let fertilities: Vec<i32> = regions.iter().map(|r| r.total_fertility).collect();
        let max = *fertilities.iter().max().unwrap();
        let min = *fertilities.iter().min().unwrap();
        assert!(max - min <= max / 2, "unbalanced split: {fertilities:?}");
    }

    #[test]
    fn tundra_heavy_regions_are_typed_tundra() {
        let (mut tile_map, ruleset) = grassland_map(10, 10);
        let tundra = ruleset.terrain(TUNDRA).unwrap().clone();
        let snow = ruleset.terrain(SNOW).unwrap().clone();
        let tiles: Vec<Tile> = tile_map.all_tiles().collect();
        for (i, &tile) in tiles.iter().enumerate() {
            if i % 3 == 0 {
                tile_map.set_base_terrain(tile, &snow);
            } else if i % 3 == 1 {
                tile_map.set_base_terrain(tile, &tundra);
            }
        }
        let mut region = Region::from_tiles(tiles, NO_CONTINENT, &tile_map, &ruleset);
        update_terrain_counts(&mut region, &tile_map, &ruleset);
        determine_region_type(&mut region, &ruleset);
        assert_eq!(region.region_type, TUNDRA);
    }

    #[test]
    fn uniform_grassland_types_as_grassland() {
        let (tile_map, ruleset) = grassland_map(10, 10);
        let tiles: Vec<Tile> = tile_map.all_tiles().collect();
        let mut region = Region::from_tiles(tiles, NO_CONTINENT, &tile_map, &ruleset);
        update_terrain_counts(&mut region, &tile_map, &ruleset);
        determine_region_type(&mut region, &ruleset);
        // All-grassland passes the grassland percent rule.
        assert_eq!(region.region_type, GRASSLAND);
    }

    #[test]
    fn poorest_regions_search_for_starts_first() {
        let (tile_map, ruleset) = grassland_map(12, 12);
        let tiles: Vec<Tile> = tile_map.all_tiles().collect();
        // 24, 72, and 48 tiles of uniform land give fertility in that ratio.
        let regions: Vec<Region> = [&tiles[..24], &tiles[24..96], &tiles[96..]]
            .iter()
            .map(|slice| Region::from_tiles(slice.to_vec(), NO_CONTINENT, &tile_map, &ruleset))
            .collect();
        assert_eq!(fertility_ascending(&regions), vec![0, 2, 1]);
    }

    #[test]
    fn junk_tiles_add_no_food_or_production() {
        let (tile_map, _) = grassland_map(12, 12);
        let mut tile_data = vec![MapGenTileData::default(); tile_map.grid.size()];
        let start = Tile::new(6 + 6 * 12);
        // Every first-ring tile claims food but is also junk; junk wins.
        for tile in start.tiles_at_distance(1, &tile_map) {
            let data = &mut tile_data[tile.index()];
            data.qualities[TileQuality::Food] = true;
            data.qualities[TileQuality::Junk] = true;
        }
        let (score, good) = evaluate_tile_for_start(start, &tile_map, &tile_data);
        assert!(!good);
        // Six junk tiles at -3 each, no food credited anywhere.
        assert_eq!(score, -18);
    }

    #[test]
    fn starts_melt_adjacent_ice() {
        let (mut tile_map, ruleset) = grassland_map(10, 10);
        let start = Tile::new(5 + 5 * 10);
        let frozen = start.neighbor_tiles(&tile_map)[0];
        tile_map.set_base_terrain(frozen, ruleset.terrain(OCEAN).unwrap());
        tile_map.add_feature(frozen, ruleset.terrain(ICE).unwrap());
        let tile_data = vec![MapGenTileData::default(); tile_map.grid.size()];
        let mut randomness = MapGenerationRandomness::new(3);
        normalize_start(start, &mut tile_map, &mut randomness, &ruleset, &tile_data);
        assert!(!frozen.has_feature(ICE, &tile_map));
    }

    #[test]
    fn flat_starts_get_a_hill_and_a_strategic_deposit() {
        let (mut tile_map, ruleset) = grassland_map(10, 10);
        let start = Tile::new(5 + 5 * 10);
        let tile_data = vec![MapGenTileData::default(); tile_map.grid.size()];
        let mut randomness = MapGenerationRandomness::new(3);
        normalize_start(start, &mut tile_map, &mut randomness, &ruleset, &tile_data);
        assert!(
            start
                .tiles_at_distance(1, &tile_map)
                .iter()
                .any(|tile| tile.is_hill(&tile_map))
        );
        let deposit = start.tiles_within_distance(2, &tile_map).iter().any(|tile| {
            tile.resource(&tile_map).is_some_and(|(name, _)| {
                ruleset
                    .resource(name)
                    .is_some_and(|r| r.resource_type == ResourceType::Strategic)
            })
        });
        assert!(deposit);
    }

    #[test]
    fn close_start_penalties_combine_and_cap() {
        let (tile_map, _) = grassland_map(20, 20);
        let mut tile_data = vec![MapGenTileData::default(); tile_map.grid.size()];
        let start = Tile::new(10 + 10 * 20);
        add_close_start_penalty(start, &tile_map, &mut tile_data);
        assert_eq!(tile_data[start.index()].close_start_penalty, 99);
        let neighbor = start.neighbor_tiles(&tile_map)[0];
        assert_eq!(tile_data[neighbor.index()].close_start_penalty, 97);
        // A second overlapping start escalates but stays capped.
        add_close_start_penalty(neighbor, &tile_map, &mut tile_data);
        assert!(tile_data[start.index()].close_start_penalty <= 99);
        assert_eq!(tile_data[neighbor.index()].close_start_penalty, 97);
    }

    #[test]
    fn every_civilization_gets_a_distinct_land_start() {
        let ruleset = Ruleset::vanilla();
        let mut parameters = MapParameters::default();
        parameters.map_type = MapType::Pangaea;
        parameters.map_size = MapSize::new(30, 24);
        parameters.seed = 42;
        parameters.num_civilizations = 4;
        parameters.num_city_states = 2;
        let mut tile_map = TileMap::new(parameters, &ruleset).unwrap();
        let mut randomness = MapGenerationRandomness::new(42);
        landmass::generate(&mut tile_map, &mut randomness, &ruleset).unwrap();
        elevation::generate(&mut tile_map, &mut randomness, &ruleset);
        continents::assign_continents(&mut tile_map);
        generate(&mut tile_map, &mut randomness, &ruleset);

        let majors: Vec<&(String, Tile)> = tile_map
            .starting_locations
            .iter()
            .filter(|(name, _)| {
                ruleset
                    .nations
                    .iter()
                    .any(|n| n.name == *name && n.is_major_civ())
            })
            .collect();
        assert_eq!(majors.len(), 4);
        for (i, (_, a)) in majors.iter().enumerate() {
            assert!(a.is_land(&tile_map));
            assert!(!a.is_impassable(&tile_map));
            for (_, b) in majors[i + 1..].iter() {
                assert_ne!(a, b, "two civilizations share a start");
            }
        }
    }
}
