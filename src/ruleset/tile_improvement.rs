use serde::{Deserialize, Serialize};

use crate::ruleset::unique::{Unique, UniqueType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileImprovement {
    pub name: String,
    #[serde(default)]
    pub terrains_can_be_built_on: Vec<String>,
    #[serde(default)]
    pub uniques: Vec<String>,
    #[serde(skip)]
    pub unique_objects: Vec<Unique>,
}

impl TileImprovement {
    pub(crate) fn parse_uniques(&mut self) {
        self.unique_objects = self.uniques.iter().map(|text| Unique::new(text)).collect();
    }

    pub fn has_unique(&self, unique_type: UniqueType) -> bool {
        self.unique_objects.iter().any(|u| u.is(unique_type))
    }
}
