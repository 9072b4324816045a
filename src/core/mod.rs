pub mod catalog;
pub mod classifier;
pub mod completion;
pub mod error;
pub mod profile;
pub mod scoring;
pub mod session;
pub mod traits;

pub use catalog::{ScenarioCatalog, ScenarioChoice, ScenarioDefinition};
pub use classifier::{Archetype, AttachmentStyle, LoveLanguage, TraitClassifier};
pub use completion::{AutoFill, CompletionAnalyzer, CompletionReport, Validation, SENTINEL};
pub use error::{EngineError, Result};
pub use profile::{ArchetypeProfile, DerivedProfile};
pub use scoring::ScoringTable;
pub use session::{AssessmentSession, ResponseState};
pub use traits::{Segment, TraitLayout, TraitVector, TRAIT_DIMENSIONS};
