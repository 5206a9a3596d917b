use serde::{Deserialize, Serialize};

/// A playable civilization or a minor city-state. The generation pipeline
/// only cares about the name, the start biases, and whether the entry is a
/// city-state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub name: String,
    /// Preferences for region assignment: `"Coast"`, a region-type terrain
    /// name, or `"Avoid [terrain]"`.
    #[serde(default)]
    pub start_bias: Vec<String>,
    #[serde(default)]
    pub city_state_type: Option<String>,
}

impl Nation {
    pub fn is_major_civ(&self) -> bool {
        self.city_state_type.is_none()
    }

    pub fn is_city_state(&self) -> bool {
        self.city_state_type.is_some()
    }

    pub fn wants_coast(&self) -> bool {
        self.start_bias.iter().any(|bias| bias == "Coast")
    }

    /// Region-type names this nation prefers, in declaration order.
    pub fn preferred_region_types(&self) -> Vec<&str> {
        self.start_bias
            .iter()
            .map(String::as_str)
            .filter(|bias| *bias != "Coast" && !bias.starts_with("Avoid ["))
            .collect()
    }

    /// Terrain names this nation wants to avoid, from `"Avoid [terrain]"`
    /// biases.
    pub fn avoided_region_types(&self) -> Vec<&str> {
        self.start_bias
            .iter()
            .filter_map(|bias| {
                bias.strip_prefix("Avoid [")
                    .and_then(|rest| rest.strip_suffix(']'))
            })
            .collect()
    }
}
