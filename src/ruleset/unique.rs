//! Placeholder-string uniques. A unique is a rule text like
//! `"Occurs at temperature between [-1] and [-0.8] and humidity between [0]
//! and [1]"`; parameters in square brackets are extracted once at ruleset
//! load and matched against [`UniqueType`] templates afterwards.

use std::sync::LazyLock;

use regex::Regex;

/// Every unique template the generation pipeline understands. Unknown unique
/// texts in a ruleset are kept but never matched, so mods may carry uniques
/// for other subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueType {
    /// `"Occurs at temperature between [amount] and [amount] and humidity
    /// between [amount] and [amount]"` on biome terrains and ice.
    TemperatureAndHumidityRange,
    /// `"Occurs in chains at high elevations"`, marks the mountain terrain.
    OccursInChains,
    /// `"Occurs in groups around high elevations"`, marks the hill feature.
    OccursInGroups,
    RoughTerrain,
    FreshWater,
    Vegetation,
    RareFeature,
    /// `"Must be adjacent to [amount] [terrain] tiles"`
    MustBeAdjacentToTiles,
    /// `"Must be adjacent to [amount] to [amount] [terrain] tiles"`
    MustBeAdjacentToRangeTiles,
    /// `"Must not be on [amount] largest landmasses"`
    MustNotBeOnLargestLandmasses,
    /// `"Must be on [amount] largest landmasses"`
    MustBeOnLargestLandmasses,
    /// `"Occurs on latitudes from [amount] to [amount] percent of distance
    /// equator to pole"`
    OccursOnLatitudes,
    /// `"Occurs in groups of [amount] to [amount] tiles"`
    OccursInGroupsOfTiles,
    /// `"Neighboring tiles will convert to [terrain]"`
    ConvertNeighbors,
    /// `"Neighboring tiles except [terrain] will convert to [terrain]"`
    ConvertNeighborsExcept,
    /// `"Is a Region with priority [amount]"`, lower numbers are tried first.
    RegionWithPriority,
    /// `"A Region is formed with at least [amount]% [terrain] tiles"`
    RegionRequirePercentSingleType,
    /// `"A Region is formed with at least [amount]% [terrain] and [terrain]
    /// tiles"`
    RegionRequirePercentTwoTypes,
    /// `"A Region can not contain more [terrain] tiles than [terrain] tiles"`
    RegionRequireFirstLessThanSecond,
    /// `"Base Terrain on this tile is not counted for Region determination"`
    IgnoreBaseTerrainForRegion,
    /// `"Considered [quality] when determining start locations"`
    StartQuality,
    /// `"Considered [quality] when determining start locations in
    /// [regionType] Regions"`
    StartQualityInRegion,
    /// `"Considered [quality] when determining start locations in all except
    /// [regionType] Regions"`
    StartQualityExceptRegion,
    /// `"[amount] to Fertility for Map Generation"`
    AddFertility,
    /// `"Always Fertility [amount] for Map Generation"`, overrides all other
    /// fertility sources on the tile.
    OverrideFertility,
    /// `"Is an ancient ruins equivalent"` on a tile improvement.
    AncientRuinsEquivalent,
}

impl UniqueType {
    /// The template with parameters blanked to `[]`, the form
    /// [`Unique::placeholder_text`] takes after parsing.
    pub const fn placeholder(self) -> &'static str {
        match self {
            UniqueType::TemperatureAndHumidityRange => {
                "Occurs at temperature between [] and [] and humidity between [] and []"
            }
            UniqueType::OccursInChains => "Occurs in chains at high elevations",
            UniqueType::OccursInGroups => "Occurs in groups around high elevations",
            UniqueType::RoughTerrain => "Rough terrain",
            UniqueType::FreshWater => "Fresh water",
            UniqueType::Vegetation => "Vegetation",
            UniqueType::RareFeature => "Rare feature",
            UniqueType::MustBeAdjacentToTiles => "Must be adjacent to [] [] tiles",
            UniqueType::MustBeAdjacentToRangeTiles => "Must be adjacent to [] to [] [] tiles",
            UniqueType::MustNotBeOnLargestLandmasses => "Must not be on [] largest landmasses",
            UniqueType::MustBeOnLargestLandmasses => "Must be on [] largest landmasses",
            UniqueType::OccursOnLatitudes => {
                "Occurs on latitudes from [] to [] percent of distance equator to pole"
            }
            UniqueType::OccursInGroupsOfTiles => "Occurs in groups of [] to [] tiles",
            UniqueType::ConvertNeighbors => "Neighboring tiles will convert to []",
            UniqueType::ConvertNeighborsExcept => {
                "Neighboring tiles except [] will convert to []"
            }
            UniqueType::RegionWithPriority => "Is a Region with priority []",
            UniqueType::RegionRequirePercentSingleType => {
                "A Region is formed with at least []% [] tiles"
            }
            UniqueType::RegionRequirePercentTwoTypes => {
                "A Region is formed with at least []% [] and [] tiles"
            }
            UniqueType::RegionRequireFirstLessThanSecond => {
                "A Region can not contain more [] tiles than [] tiles"
            }
            UniqueType::IgnoreBaseTerrainForRegion => {
                "Base Terrain on this tile is not counted for Region determination"
            }
            UniqueType::StartQuality => "Considered [] when determining start locations",
            UniqueType::StartQualityInRegion => {
                "Considered [] when determining start locations in [] Regions"
            }
            UniqueType::StartQualityExceptRegion => {
                "Considered [] when determining start locations in all except [] Regions"
            }
            UniqueType::AddFertility => "[] to Fertility for Map Generation",
            UniqueType::OverrideFertility => "Always Fertility [] for Map Generation",
            UniqueType::AncientRuinsEquivalent => "Is an ancient ruins equivalent",
        }
    }
}

/// A parsed unique: the original text with every `[param]` replaced by `[]`,
/// plus the extracted parameters in order.
#[derive(Debug, Clone)]
pub struct Unique {
    pub text: String,
    pub placeholder_text: String,
    pub params: Vec<String>,
}

static PARAMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(.+?)\]").unwrap_or_else(|e| panic!("invalid params regex: {e}"))
});

impl Unique {
    pub fn new(text: &str) -> Self {
        let placeholder_text = PARAMS_REGEX.replace_all(text, "[]").to_string();
        let params = PARAMS_REGEX
            .captures_iter(text)
            .map(|cap| cap[1].to_owned())
            .collect();
        Self {
            text: text.to_owned(),
            placeholder_text,
            params,
        }
    }

    pub fn is(&self, unique_type: UniqueType) -> bool {
        self.placeholder_text == unique_type.placeholder()
    }

    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn param_f64(&self, index: usize) -> f64 {
        self.param(index).parse().unwrap_or(0.0)
    }

    pub fn param_i32(&self, index: usize) -> i32 {
        self.param(index).parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_params_in_order() {
        let unique = Unique::new(
            "Occurs at temperature between [-1] and [-0.8] and humidity between [0] and [1]",
        );
        assert!(unique.is(UniqueType::TemperatureAndHumidityRange));
        assert_eq!(unique.params, vec!["-1", "-0.8", "0", "1"]);
        assert_eq!(unique.param_f64(1), -0.8);
    }

    #[test]
    fn parameterless_uniques_match_verbatim() {
        let unique = Unique::new("Rough terrain");
        assert!(unique.is(UniqueType::RoughTerrain));
        assert!(unique.params.is_empty());
    }

    #[test]
    fn mismatched_template_does_not_match() {
        let unique = Unique::new("Considered [Food] when determining start locations");
        assert!(unique.is(UniqueType::StartQuality));
        assert!(!unique.is(UniqueType::StartQualityInRegion));
        assert_eq!(unique.param(0), "Food");
    }

    #[test]
    fn unknown_uniques_are_tolerated() {
        let unique = Unique::new("Blocks line-of-sight from tiles at same elevation");
        assert!(!unique.is(UniqueType::RoughTerrain));
    }
}
