use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scenario catalog is empty")]
    EmptyCatalog,

    #[error("Scenario at position {position} declares index {declared}")]
    CatalogIndex { position: usize, declared: usize },

    #[error("Scenario {index} is invalid: {reason}")]
    InvalidScenario { index: usize, reason: String },

    #[error("Catalog has {catalog} scenarios but the trait layout has {layout} dimensions")]
    DimensionMismatch { catalog: usize, layout: usize },

    #[error("Invalid trait layout: {0}")]
    Layout(String),

    #[error("Invalid scoring table: {0}")]
    ScoringTable(String),

    #[error("Trait vector has {actual} values, expected {expected}")]
    TraitLength { expected: usize, actual: usize },

    #[error("Trait value at index {index} is out of range: {value}")]
    TraitValue { index: usize, value: f64 },

    #[error("Scenario index {index} is outside the catalog (0-{max})")]
    ScenarioIndex { index: usize, max: usize },

    #[error("Scenario {index} has no choice {choice}")]
    ChoiceIndex { index: usize, choice: usize },

    #[error("Response value for scenario {index} is out of range: {value}")]
    ResponseValue { index: usize, value: f64 },

    #[error("Assessment incomplete: {} scenario(s) unanswered", .missing.len())]
    Incomplete { missing: Vec<usize> },
}

pub type Result<T> = std::result::Result<T, EngineError>;
