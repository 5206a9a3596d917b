use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// The landmass macro-pattern, chosen once per map. Each variant is a
/// different noise-shaping function in the landmass stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    Pangaea,
    ContinentAndIslands,
    TwoContinents,
    ThreeContinents,
    FourCorners,
    Archipelago,
    InnerSea,
    Perlin,
    Fractal,
    SmallContinents,
    Lakes,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapShape {
    Rectangular,
    /// A hexagonal playable area inscribed in the rectangle; tiles outside
    /// the hex radius are forced to ocean.
    Hexagonal,
    /// All four edges forced to ocean, so the world reads as a bounded disc.
    FlatEarth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: i32,
    pub height: i32,
}

impl MapSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// The map radius used by the wonder-count formula and the spread-out
    /// chooser's separation heuristic.
    pub const fn radius(&self) -> i32 {
        let half_width = self.width / 2;
        let half_height = self.height / 2;
        if half_width > half_height {
            half_width
        } else {
            half_height
        }
    }
}

/// The configuration bag for one generation run. Immutable during a run,
/// except for `seed` (resolved once if 0) and `created_with_version`
/// (stamped once at run start).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapParameters {
    pub map_type: MapType,
    pub shape: MapShape,
    pub map_size: MapSize,
    /// Wrap east-west. Wrapping maps get water forced onto the seam columns
    /// so the join is always navigable.
    pub world_wrap: bool,
    /// 0 means "pick one from the clock at run start".
    pub seed: u64,
    /// Shapes the noise-to-band curve for mountains and hills. Higher values
    /// flatten the world.
    pub elevation_exponent: f64,
    /// Sharpens the latitude-to-temperature curve toward the poles.
    pub temperature_extremeness: f64,
    pub temperature_shift: f64,
    /// Noise scale for the humidity and temperature fields, in tiles.
    pub tiles_per_biome_area: u32,
    pub max_coast_extension: u32,
    /// Connected water bodies at or under this size become lakes.
    pub max_lake_size: u32,
    pub vegetation_richness: f64,
    pub rare_features_richness: f64,
    pub resource_richness: f64,
    /// Land/water cutoff for the landmass patterns. Patterns with coverage
    /// guarantees lower their own effective threshold from here.
    pub water_threshold: f64,
    pub no_rivers: bool,
    pub no_ruins: bool,
    pub no_natural_wonders: bool,
    /// How many major civilizations get regions and start positions. Clamped
    /// to the nations the ruleset actually defines.
    pub num_civilizations: u32,
    pub num_city_states: u32,
    pub created_with_version: String,
}

impl MapParameters {
    /// Resolves a zero seed to a clock-derived one. Called once at run start.
    pub fn resolve_seed(&mut self) -> u64 {
        if self.seed == 0 {
            self.seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_millis() as u64)
                .unwrap_or(1);
        }
        self.seed
    }
}

impl Default for MapParameters {
    fn default() -> Self {
        Self {
            map_type: MapType::Perlin,
            shape: MapShape::Rectangular,
            map_size: MapSize::new(40, 30),
            world_wrap: false,
            seed: 0,
            elevation_exponent: 0.7,
            temperature_extremeness: 0.6,
            temperature_shift: 0.0,
            tiles_per_biome_area: 6,
            max_coast_extension: 2,
            max_lake_size: 10,
            vegetation_richness: 0.4,
            rare_features_richness: 0.05,
            resource_richness: 0.1,
            water_threshold: 0.0,
            no_rivers: false,
            no_ruins: false,
            no_natural_wonders: false,
            num_civilizations: 4,
            num_city_states: 2,
            created_with_version: String::new(),
        }
    }
}
