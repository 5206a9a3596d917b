//! Terrain and improvement names the generation pipeline treats as special.
//! All of them must exist in the active ruleset for the corresponding stage
//! to have its full effect; missing ones degrade the stage gracefully.

pub const GRASSLAND: &str = "Grassland";
pub const PLAINS: &str = "Plains";
pub const DESERT: &str = "Desert";
pub const TUNDRA: &str = "Tundra";
pub const SNOW: &str = "Snow";

pub const OCEAN: &str = "Ocean";
pub const COAST: &str = "Coast";
pub const LAKES: &str = "Lakes";

pub const MOUNTAIN: &str = "Mountain";
pub const HILL: &str = "Hill";

pub const FOREST: &str = "Forest";
pub const JUNGLE: &str = "Jungle";
pub const FLOOD_PLAINS: &str = "Flood plains";
pub const ICE: &str = "Ice";
