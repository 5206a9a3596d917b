//! The read-only rules catalog: terrains (bases, features, natural wonders),
//! tile resources, tile improvements, and nations, loaded from JSON with
//! comments. Collections keep load order so "first terrain matching" queries
//! are deterministic.

pub mod nation;
pub mod terrain;
pub mod tile_improvement;
pub mod tile_resource;
pub mod unique;

use serde::de::DeserializeOwned;

use crate::ruleset::{
    nation::Nation,
    terrain::{Terrain, TerrainKind},
    tile_improvement::TileImprovement,
    tile_resource::TileResource,
    unique::UniqueType,
};

#[derive(Debug, Clone)]
pub struct Ruleset {
    pub terrains: Vec<Terrain>,
    pub tile_resources: Vec<TileResource>,
    pub tile_improvements: Vec<TileImprovement>,
    pub nations: Vec<Nation>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::vanilla()
    }
}

impl Ruleset {
    /// The embedded base ruleset.
    pub fn vanilla() -> Self {
        let terrains = from_json_with_comments(
            include_str!("../jsons/vanilla/Terrains.json"),
            "Terrains.json",
        );
        let tile_resources = from_json_with_comments(
            include_str!("../jsons/vanilla/TileResources.json"),
            "TileResources.json",
        );
        let tile_improvements = from_json_with_comments(
            include_str!("../jsons/vanilla/TileImprovements.json"),
            "TileImprovements.json",
        );
        let nations = from_json_with_comments(
            include_str!("../jsons/vanilla/Nations.json"),
            "Nations.json",
        );
        let mut ruleset = Self {
            terrains,
            tile_resources,
            tile_improvements,
            nations,
        };
        ruleset.parse_uniques();
        ruleset
    }

    /// Loads a ruleset from caller-provided JSON strings (comments allowed).
    pub fn from_json(
        terrains: &str,
        tile_resources: &str,
        tile_improvements: &str,
        nations: &str,
    ) -> serde_json::Result<Self> {
        let mut ruleset = Self {
            terrains: serde_json::from_str(&strip_json_comments(terrains))?,
            tile_resources: serde_json::from_str(&strip_json_comments(tile_resources))?,
            tile_improvements: serde_json::from_str(&strip_json_comments(tile_improvements))?,
            nations: serde_json::from_str(&strip_json_comments(nations))?,
        };
        ruleset.parse_uniques();
        Ok(ruleset)
    }

    fn parse_uniques(&mut self) {
        for terrain in &mut self.terrains {
            terrain.parse_uniques();
        }
        for resource in &mut self.tile_resources {
            resource.parse_uniques();
        }
        for improvement in &mut self.tile_improvements {
            improvement.parse_uniques();
        }
    }

    pub fn terrain(&self, name: &str) -> Option<&Terrain> {
        self.terrains.iter().find(|t| t.name == name)
    }

    pub fn base_terrains(&self) -> impl Iterator<Item = &Terrain> {
        self.terrains.iter().filter(|t| t.is_base_terrain())
    }

    pub fn features(&self) -> impl Iterator<Item = &Terrain> {
        self.terrains
            .iter()
            .filter(|t| t.r#type == TerrainKind::TerrainFeature)
    }

    pub fn natural_wonders(&self) -> impl Iterator<Item = &Terrain> {
        self.terrains
            .iter()
            .filter(|t| t.r#type == TerrainKind::NaturalWonder)
    }

    /// The first water base terrain, the default the map is filled with.
    pub fn first_water_terrain(&self) -> Option<&Terrain> {
        self.base_terrains().find(|t| t.is_water())
    }

    /// The first passable land base terrain, used as the flat fallback.
    pub fn first_land_terrain(&self) -> Option<&Terrain> {
        self.base_terrains().find(|t| t.is_land() && !t.impassable)
    }

    /// The terrain mountains are made of, if the ruleset has one.
    pub fn mountain_terrain(&self) -> Option<&Terrain> {
        self.terrains
            .iter()
            .find(|t| t.has_unique(UniqueType::OccursInChains))
    }

    /// The feature hills are made of, if the ruleset has one.
    pub fn hill_terrain(&self) -> Option<&Terrain> {
        self.terrains
            .iter()
            .find(|t| t.has_unique(UniqueType::OccursInGroups))
    }

    pub fn ruin_improvement(&self) -> Option<&TileImprovement> {
        self.tile_improvements
            .iter()
            .find(|i| i.has_unique(UniqueType::AncientRuinsEquivalent))
    }

    pub fn resource(&self, name: &str) -> Option<&TileResource> {
        self.tile_resources.iter().find(|r| r.name == name)
    }
}

fn from_json_with_comments<T: DeserializeOwned>(json: &str, file: &str) -> Vec<T> {
    serde_json::from_str(&strip_json_comments(json))
        .unwrap_or_else(|e| panic!("embedded {file} is invalid: {e}"))
}

/// Removes `// line` and `/* block */` comments from a JSON string, replacing
/// them with spaces so parse errors still point at the right location.
pub fn strip_json_comments(json_with_comments: &str) -> String {
    let mut output = String::with_capacity(json_with_comments.len());
    let mut chars = json_with_comments.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(current) = chars.next() {
        if in_string {
            output.push(current);
            if escaped {
                escaped = false;
            } else if current == '\\' {
                escaped = true;
            } else if current == '"' {
                in_string = false;
            }
            continue;
        }
        match current {
            '"' => {
                in_string = true;
                output.push(current);
            }
            '/' if chars.peek() == Some(&'/') => {
                output.push_str("  ");
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        output.push('\n');
                        break;
                    }
                    output.push(' ');
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                output.push_str("  ");
                let mut last = ' ';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        output.push('\n');
                    } else {
                        output.push(' ');
                    }
                    if last == '*' && skipped == '/' {
                        break;
                    }
                    last = skipped;
                }
            }
            _ => output.push(current),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let json = "{\n  // a comment\n  \"a\": 1, /* inline */ \"b\": \"x // not a comment\"\n}";
        let stripped = strip_json_comments(json);
        let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], "x // not a comment");
    }

    #[test]
    fn vanilla_ruleset_loads_and_is_complete() {
        let ruleset = Ruleset::vanilla();
        assert!(ruleset.first_water_terrain().is_some());
        assert!(ruleset.first_land_terrain().is_some());
        assert!(ruleset.mountain_terrain().is_some());
        assert!(ruleset.hill_terrain().is_some());
        assert!(ruleset.ruin_improvement().is_some());
        assert!(ruleset.natural_wonders().count() >= 4);
        assert!(ruleset.nations.iter().any(|n| n.is_city_state()));
        assert!(ruleset.nations.iter().any(|n| n.is_major_civ()));
    }

    #[test]
    fn load_order_is_preserved() {
        let ruleset = Ruleset::vanilla();
        // Ocean is first so the map fill default stays stable.
        assert_eq!(ruleset.first_water_terrain().map(|t| t.name.as_str()), Some("Ocean"));
        assert_eq!(ruleset.first_land_terrain().map(|t| t.name.as_str()), Some("Grassland"));
    }
}
