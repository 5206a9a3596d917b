use serde::{Deserialize, Serialize};

use crate::ruleset::unique::{Unique, UniqueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    Land,
    Water,
    TerrainFeature,
    NaturalWonder,
}

/// One terrain entry: a base terrain (land or water), a terrain feature, or
/// a natural wonder. Which of the optional fields matter depends on the kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terrain {
    pub name: String,
    pub r#type: TerrainKind,
    /// For features and wonders: the base terrains they may sit on.
    #[serde(default)]
    pub occurs_on: Vec<String>,
    /// For wonders: the base terrain the placed tile becomes.
    #[serde(default)]
    pub turns_into: Option<String>,
    #[serde(default)]
    pub impassable: bool,
    /// For wonders: relative selection weight in the weighted draw.
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub uniques: Vec<String>,
    /// Parsed from `uniques` once after load.
    #[serde(skip)]
    pub unique_objects: Vec<Unique>,
}

impl Terrain {
    pub(crate) fn parse_uniques(&mut self) {
        self.unique_objects = self.uniques.iter().map(|text| Unique::new(text)).collect();
    }

    pub fn is_base_terrain(&self) -> bool {
        matches!(self.r#type, TerrainKind::Land | TerrainKind::Water)
    }

    pub fn is_water(&self) -> bool {
        self.r#type == TerrainKind::Water
    }

    pub fn is_land(&self) -> bool {
        self.r#type == TerrainKind::Land
    }

    pub fn has_unique(&self, unique_type: UniqueType) -> bool {
        self.unique_objects.iter().any(|u| u.is(unique_type))
    }

    pub fn matching_uniques(&self, unique_type: UniqueType) -> impl Iterator<Item = &Unique> {
        self.unique_objects
            .iter()
            .filter(move |u| u.is(unique_type))
    }

    /// Whether any declared temperature/humidity range accepts the given
    /// values. Terrains without such uniques never match.
    pub fn matches_climate(&self, temperature: f64, humidity: f64) -> bool {
        self.matching_uniques(UniqueType::TemperatureAndHumidityRange)
            .any(|unique| {
                temperature >= unique.param_f64(0)
                    && temperature <= unique.param_f64(1)
                    && humidity >= unique.param_f64(2)
                    && humidity <= unique.param_f64(3)
            })
    }

    pub fn occurs_on(&self, base_terrain: &str) -> bool {
        self.occurs_on.iter().any(|name| name == base_terrain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain_with_uniques(uniques: &[&str]) -> Terrain {
        let mut terrain = Terrain {
            name: "Test".to_owned(),
            r#type: TerrainKind::Land,
            occurs_on: Vec::new(),
            turns_into: None,
            impassable: false,
            weight: 0,
            uniques: uniques.iter().map(|s| s.to_string()).collect(),
            unique_objects: Vec::new(),
        };
        terrain.parse_uniques();
        terrain
    }

    #[test]
    fn climate_range_is_inclusive() {
        let terrain = terrain_with_uniques(&[
            "Occurs at temperature between [-0.4] and [0.8] and humidity between [0.5] and [1]",
        ]);
        assert!(terrain.matches_climate(0.0, 0.5));
        assert!(terrain.matches_climate(0.8, 1.0));
        assert!(!terrain.matches_climate(0.81, 1.0));
        assert!(!terrain.matches_climate(0.0, 0.49));
    }

    #[test]
    fn any_of_several_ranges_matches() {
        let terrain = terrain_with_uniques(&[
            "Occurs at temperature between [-0.4] and [0.8] and humidity between [0] and [0.5]",
            "Occurs at temperature between [0.8] and [1] and humidity between [0.7] and [1]",
        ]);
        assert!(terrain.matches_climate(0.9, 0.8));
        assert!(!terrain.matches_climate(0.9, 0.6));
    }

    #[test]
    fn terrains_without_ranges_never_match() {
        let terrain = terrain_with_uniques(&["Rough terrain"]);
        assert!(!terrain.matches_climate(0.0, 0.5));
        assert!(terrain.has_unique(UniqueType::RoughTerrain));
    }
}
