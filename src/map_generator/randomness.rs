//! The single random source for a generation run: a seeded [`StdRng`] plus
//! noise sampling helpers and the spread-out location chooser. Exactly one
//! instance is threaded by `&mut` through every stage so reruns with the
//! same seed replay identically.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    grid::hex::hexagonal_radius_for_area,
    map_generator::perlin,
    tile_map::{TileMap, tile::Tile},
};

pub struct MapGenerationRandomness {
    pub rng: StdRng,
}

impl MapGenerationRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// A fresh z-plane for one noise field. Each stage draws its own so the
    /// fields are decorrelated but fully replayable.
    pub fn next_noise_seed(&mut self) -> f64 {
        self.rng.random::<i32>() as f64
    }

    /// Octave noise at the tile's world position. The stage seed selects the
    /// z-plane of the 3D noise.
    pub fn perlin_noise(&self, tile: Tile, tile_map: &TileMap, seed: f64) -> f64 {
        self.perlin_noise_custom(tile, tile_map, seed, 6, 10.0)
    }

    pub fn perlin_noise_custom(
        &self,
        tile: Tile,
        tile_map: &TileMap,
        seed: f64,
        n_octaves: u32,
        scale: f64,
    ) -> f64 {
        let position = tile_map.grid.world_position(tile.index());
        perlin::noise3d(position.x, position.y, seed, n_octaves, 0.5, 2.0, scale)
    }

    /// Ridged noise at the tile's world position, for island-chain patterns.
    pub fn ridged_noise(&self, tile: Tile, tile_map: &TileMap, seed: f64) -> f64 {
        let position = tile_map.grid.world_position(tile.index());
        perlin::ridged_noise3d(position.x, position.y, seed, 6, 0.5, 2.0, 10.0)
    }

    /// Picks `number` tiles from `suitable_tiles` that are well separated,
    /// balancing picks across base-terrain buckets. Starts from a separation
    /// derived from map size and candidate density and relaxes it by 1 until
    /// satisfiable. May return fewer tiles only when the candidates cannot
    /// support more even at distance 1.
    pub fn choose_spread_out_locations(
        &mut self,
        number: usize,
        suitable_tiles: &[Tile],
        map_radius: i32,
        tile_map: &TileMap,
    ) -> Vec<Tile> {
        if number == 0 || suitable_tiles.is_empty() {
            return Vec::new();
        }

        // The empiric formula comes close to eliminating distance retries.
        // Needing 60% or more of the candidates means starting at distance 1.
        let sparsity_factor =
            (hexagonal_radius_for_area(suitable_tiles.len()) / map_radius as f64).powf(0.333);
        let initial_distance = if number == 1 || number * 5 >= suitable_tiles.len() * 3 {
            1
        } else {
            ((map_radius as f64 * 0.666 / hexagonal_radius_for_area(number).max(1.0).powf(0.9)
                * sparsity_factor
                + 0.5) as i32)
                .clamp(1, 10)
        };

        // Base-terrain buckets in first-seen order, so equal counts resolve
        // deterministically.
        let mut bucket_names: Vec<&str> = Vec::new();
        let mut buckets: Vec<Vec<Tile>> = Vec::new();
        for &tile in suitable_tiles {
            let terrain = tile.base_terrain(tile_map);
            match bucket_names.iter().position(|name| *name == terrain) {
                Some(index) => buckets[index].push(tile),
                None => {
                    bucket_names.push(terrain);
                    buckets.push(vec![tile]);
                }
            }
        }

        for distance in (1..=initial_distance).rev() {
            let mut available = buckets.clone();
            let mut chosen_counts = vec![0usize; buckets.len()];
            let mut chosen_tiles: Vec<Tile> = Vec::with_capacity(number);

            for _ in 0..number {
                let Some(bucket_index) = (0..buckets.len())
                    .filter(|&i| !available[i].is_empty())
                    .min_by_key(|&i| chosen_counts[i])
                else {
                    break;
                };
                let pick = self.rng.random_range(0..available[bucket_index].len());
                let chosen = available[bucket_index][pick];
                for bucket in &mut available {
                    bucket.retain(|tile| tile.distance_to(chosen, tile_map) > distance);
                }
                chosen_tiles.push(chosen);
                chosen_counts[bucket_index] += 1;
            }

            if chosen_tiles.len() == number || distance == 1 {
                return chosen_tiles;
            }
        }
        unreachable!("the distance-1 iteration always returns");
    }
}
