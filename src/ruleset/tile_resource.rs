use serde::{Deserialize, Serialize};

use crate::ruleset::unique::Unique;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Bonus,
    Luxury,
    Strategic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileResource {
    pub name: String,
    pub resource_type: ResourceType,
    /// Base terrains and features this resource may appear on.
    #[serde(default)]
    pub terrains_can_be_found_on: Vec<String>,
    #[serde(default)]
    pub uniques: Vec<String>,
    #[serde(skip)]
    pub unique_objects: Vec<Unique>,
}

impl TileResource {
    pub(crate) fn parse_uniques(&mut self) {
        self.unique_objects = self.uniques.iter().map(|text| Unique::new(text)).collect();
    }

    /// Whether the tile's terrain (base or topmost matching feature) can host
    /// this resource. The caller passes every terrain name present on the
    /// tile.
    pub fn can_be_found_on<'a>(&self, mut tile_terrains: impl Iterator<Item = &'a str>) -> bool {
        tile_terrains.any(|name| self.terrains_can_be_found_on.iter().any(|t| t == name))
    }
}
