//! Trait-vector classification and StoryQuest completion checks.
//!
//! [`core`] holds the pure engine; [`config`] and [`cli`] wire it to files
//! and the `soulmates` binary.

pub mod cli;
pub mod config;
pub mod core;

pub use crate::core::{
    Archetype, AssessmentSession, AttachmentStyle, CompletionAnalyzer, CompletionReport,
    DerivedProfile, EngineError, LoveLanguage, ScenarioCatalog, ScoringTable, TraitClassifier,
    TraitLayout, TraitVector,
};
