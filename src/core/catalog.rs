use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use super::error::{EngineError, Result};
use super::traits::TraitLayout;

const BUNDLED_CATALOG: &str = include_str!("../../assets/scenarios.json");

/// One selectable answer of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioChoice {
    pub text: String,
    /// Trait value recorded when this choice is picked (0.0-1.0)
    pub value: f64,
}

/// One StoryQuest question, contributing exactly one trait dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Trait-vector index this scenario fills
    pub index: usize,
    pub chapter: String,
    pub category: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub story_text: String,
    pub choices: Vec<ScenarioChoice>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    scenarios: Vec<ScenarioDefinition>,
}

/// Ordered, validated scenario list.
///
/// Position `i` always holds the scenario that declares index `i`, so a
/// response array and the catalog can be zipped without lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioCatalog {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioCatalog {
    /// Validate and wrap a list of scenarios
    pub fn from_definitions(scenarios: Vec<ScenarioDefinition>) -> Result<Self> {
        if scenarios.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }

        for (position, scenario) in scenarios.iter().enumerate() {
            if scenario.index != position {
                return Err(EngineError::CatalogIndex {
                    position,
                    declared: scenario.index,
                });
            }
            if scenario.choices.is_empty() {
                return Err(EngineError::InvalidScenario {
                    index: position,
                    reason: "no choices".to_string(),
                });
            }
            for choice in &scenario.choices {
                if choice.text.trim().is_empty() {
                    return Err(EngineError::InvalidScenario {
                        index: position,
                        reason: "choice with empty text".to_string(),
                    });
                }
                if !(0.0..=1.0).contains(&choice.value) {
                    return Err(EngineError::InvalidScenario {
                        index: position,
                        reason: format!("choice value {} outside 0-1", choice.value),
                    });
                }
            }
        }

        debug!("Scenario catalog validated: {} scenarios", scenarios.len());
        Ok(Self { scenarios })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_definitions(file.scenarios)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The 32-scenario catalog shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScenarioDefinition> {
        self.scenarios.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDefinition> {
        self.scenarios.iter()
    }

    pub fn last_index(&self) -> usize {
        self.scenarios.len() - 1
    }

    /// Distinct chapters in the order they first appear
    pub fn chapters(&self) -> Vec<&str> {
        let mut chapters: Vec<&str> = Vec::new();
        for scenario in &self.scenarios {
            if !chapters.contains(&scenario.chapter.as_str()) {
                chapters.push(&scenario.chapter);
            }
        }
        chapters
    }

    pub fn scenarios_for_chapter(&self, chapter: &str) -> Vec<&ScenarioDefinition> {
        self.scenarios
            .iter()
            .filter(|s| s.chapter == chapter)
            .collect()
    }

    /// Fail unless there is exactly one scenario per trait dimension.
    ///
    /// Category labels that disagree with the layout's segment are logged but
    /// not rejected.
    pub fn check_layout(&self, layout: &TraitLayout) -> Result<()> {
        if self.len() != layout.dimension() {
            return Err(EngineError::DimensionMismatch {
                catalog: self.len(),
                layout: layout.dimension(),
            });
        }
        for scenario in &self.scenarios {
            if let Some(segment) = layout.segment_of(scenario.index) {
                if scenario.category != segment.label() {
                    warn!(
                        "Scenario {} category '{}' does not match segment '{}'",
                        scenario.index, scenario.category, segment
                    );
                }
            }
        }
        Ok(())
    }
}
