use serde::{Deserialize, Serialize};
use std::path::Path;

use super::classifier::{Archetype, LoveLanguage};
use super::error::{EngineError, Result};
use super::traits::{Segment, SegmentAverages};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Hand-tuned classification constants.
///
/// Kept apart from the classifier so they can be versioned and tuned
/// without touching the scoring control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    pub version: u32,
    pub archetypes: Vec<ArchetypeRule>,
    pub attachment: AttachmentThresholds,
    pub love_languages: Vec<LoveLanguageRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeRule {
    pub archetype: Archetype,
    pub score: ScoreShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreShape {
    /// Linear combination of segment means; weights sum to 1.0
    Weighted { terms: Vec<WeightedTerm> },
    /// `1 - sum(|center - mean|)` over the listed segments
    Balance { center: f64, segments: Vec<Segment> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub segment: Segment,
    pub weight: f64,
    /// Score `1 - mean` instead of `mean`
    #[serde(default)]
    pub inverted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachmentThresholds {
    pub segment: Segment,
    /// Standard deviation strictly above this is disorganized
    pub disorganized_std_dev: f64,
    /// Mean strictly below this is avoidant
    pub avoidant_below: f64,
    /// Mean strictly above this is anxious
    pub anxious_above: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoveLanguageRule {
    pub language: LoveLanguage,
    pub terms: Vec<WeightedTerm>,
    pub threshold: Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// score > value
    Above { value: f64 },
    /// low < score < high
    Band { low: f64, high: f64 },
}

impl WeightedTerm {
    fn new(segment: Segment, weight: f64) -> Self {
        Self {
            segment,
            weight,
            inverted: false,
        }
    }

    fn inverted(segment: Segment, weight: f64) -> Self {
        Self {
            segment,
            weight,
            inverted: true,
        }
    }

    fn value(&self, averages: &SegmentAverages) -> f64 {
        let mean = averages.get(self.segment);
        if self.inverted {
            (1.0 - mean) * self.weight
        } else {
            mean * self.weight
        }
    }
}

/// Sum terms left to right so results are reproducible bit for bit
fn weighted_sum(terms: &[WeightedTerm], averages: &SegmentAverages) -> f64 {
    terms.iter().map(|t| t.value(averages)).sum()
}

fn check_weights(owner: &str, terms: &[WeightedTerm]) -> Result<()> {
    if terms.is_empty() {
        return Err(EngineError::ScoringTable(format!("{} has no terms", owner)));
    }
    if let Some(term) = terms.iter().find(|t| !(t.weight >= 0.0)) {
        return Err(EngineError::ScoringTable(format!(
            "{} has negative weight {} on {}",
            owner, term.weight, term.segment
        )));
    }
    let total: f64 = terms.iter().map(|t| t.weight).sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(EngineError::ScoringTable(format!(
            "{} weights sum to {}, expected 1.0",
            owner, total
        )));
    }
    Ok(())
}

impl ScoreShape {
    pub fn score(&self, averages: &SegmentAverages) -> f64 {
        match self {
            ScoreShape::Weighted { terms } => weighted_sum(terms, averages),
            ScoreShape::Balance { center, segments } => segments
                .iter()
                .fold(1.0, |acc, s| acc - (center - averages.get(*s)).abs()),
        }
    }
}

impl Threshold {
    pub fn accepts(&self, score: f64) -> bool {
        match *self {
            Threshold::Above { value } => score > value,
            Threshold::Band { low, high } => score > low && score < high,
        }
    }
}

impl LoveLanguageRule {
    pub fn score(&self, averages: &SegmentAverages) -> f64 {
        weighted_sum(&self.terms, averages)
    }
}

impl ScoringTable {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: ScoringTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn archetype_rule(&self, archetype: Archetype) -> Option<&ArchetypeRule> {
        self.archetypes.iter().find(|r| r.archetype == archetype)
    }

    pub fn love_language_rule(&self, language: LoveLanguage) -> Option<&LoveLanguageRule> {
        self.love_languages.iter().find(|r| r.language == language)
    }

    /// Reject tables the classifier cannot evaluate deterministically
    pub fn validate(&self) -> Result<()> {
        for archetype in Archetype::ALL {
            let count = self
                .archetypes
                .iter()
                .filter(|r| r.archetype == archetype)
                .count();
            if count != 1 {
                return Err(EngineError::ScoringTable(format!(
                    "archetype '{}' has {} rules, expected 1",
                    archetype, count
                )));
            }
        }
        for rule in &self.archetypes {
            match &rule.score {
                ScoreShape::Weighted { terms } => {
                    check_weights(&rule.archetype.to_string(), terms)?
                }
                ScoreShape::Balance { center, segments } => {
                    if segments.is_empty() || !(0.0..=1.0).contains(center) {
                        return Err(EngineError::ScoringTable(format!(
                            "{} balance rule needs segments and a center in 0-1",
                            rule.archetype
                        )));
                    }
                }
            }
        }

        let a = &self.attachment;
        if !(a.avoidant_below < a.anxious_above) || !(a.disorganized_std_dev >= 0.0) {
            return Err(EngineError::ScoringTable(format!(
                "attachment thresholds are inconsistent: avoidant < {}, anxious > {}, std dev > {}",
                a.avoidant_below, a.anxious_above, a.disorganized_std_dev
            )));
        }

        for language in LoveLanguage::ALL {
            let count = self
                .love_languages
                .iter()
                .filter(|r| r.language == language)
                .count();
            if count != 1 {
                return Err(EngineError::ScoringTable(format!(
                    "love language '{}' has {} rules, expected 1",
                    language, count
                )));
            }
        }
        for rule in &self.love_languages {
            check_weights(&rule.language.to_string(), &rule.terms)?;
            if let Threshold::Band { low, high } = rule.threshold {
                if !(low < high) {
                    return Err(EngineError::ScoringTable(format!(
                        "{} band {}..{} is empty",
                        rule.language, low, high
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        use Segment::*;
        let w = WeightedTerm::new;
        let inv = WeightedTerm::inverted;
        let weighted = |archetype, terms| ArchetypeRule {
            archetype,
            score: ScoreShape::Weighted { terms },
        };
        let language = |language, terms, threshold| LoveLanguageRule {
            language,
            terms,
            threshold,
        };

        Self {
            version: 1,
            archetypes: vec![
                weighted(
                    Archetype::Guardian,
                    vec![w(Attachment, 0.3), w(LifeStructure, 0.3), w(Values, 0.2), w(Social, 0.2)],
                ),
                weighted(
                    Archetype::Explorer,
                    vec![
                        inv(LifeStructure, 0.3),
                        w(Cognitive, 0.3),
                        w(Sexual, 0.2),
                        inv(Attachment, 0.2),
                    ],
                ),
                weighted(
                    Archetype::Nurturer,
                    vec![w(Social, 0.3), w(Attachment, 0.3), w(Values, 0.2), w(Sexual, 0.2)],
                ),
                weighted(
                    Archetype::Visionary,
                    vec![
                        w(Values, 0.3),
                        w(Cognitive, 0.3),
                        inv(LifeStructure, 0.2),
                        w(Social, 0.2),
                    ],
                ),
                ArchetypeRule {
                    archetype: Archetype::Harmonizer,
                    score: ScoreShape::Balance {
                        center: 0.5,
                        segments: vec![Attachment, Conflict, Cognitive],
                    },
                },
                weighted(
                    Archetype::Catalyst,
                    vec![
                        inv(LifeStructure, 0.3),
                        w(Conflict, 0.3),
                        w(Cognitive, 0.2),
                        w(Sexual, 0.2),
                    ],
                ),
                weighted(
                    Archetype::Anchor,
                    vec![
                        w(LifeStructure, 0.3),
                        w(Attachment, 0.3),
                        w(Values, 0.2),
                        inv(Conflict, 0.2),
                    ],
                ),
                weighted(
                    Archetype::FreeSpirit,
                    vec![
                        inv(LifeStructure, 0.4),
                        inv(Attachment, 0.3),
                        w(Sexual, 0.2),
                        inv(Values, 0.1),
                    ],
                ),
            ],
            attachment: AttachmentThresholds {
                segment: Attachment,
                disorganized_std_dev: 0.3,
                avoidant_below: 0.3,
                anxious_above: 0.7,
            },
            love_languages: vec![
                language(
                    LoveLanguage::WordsOfAffirmation,
                    vec![w(Social, 0.6), w(Cognitive, 0.4)],
                    Threshold::Above { value: 0.6 },
                ),
                language(
                    LoveLanguage::ActsOfService,
                    vec![w(Values, 0.6), w(Attachment, 0.4)],
                    Threshold::Above { value: 0.6 },
                ),
                language(
                    LoveLanguage::ReceivingGifts,
                    vec![w(Social, 0.5), w(Values, 0.5)],
                    Threshold::Band {
                        low: 0.5,
                        high: 0.7,
                    },
                ),
                language(
                    LoveLanguage::QualityTime,
                    vec![w(Attachment, 0.6), w(Social, 0.4)],
                    Threshold::Above { value: 0.6 },
                ),
                language(
                    LoveLanguage::PhysicalTouch,
                    vec![w(Sexual, 0.7), w(Attachment, 0.3)],
                    Threshold::Above { value: 0.6 },
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::TraitLayout;

    #[test]
    fn test_default_table_is_valid() {
        let table = ScoringTable::default();
        assert!(table.validate().is_ok());
        assert_eq!(table.archetypes.len(), 8);
        assert_eq!(table.love_languages.len(), 5);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let mut table = ScoringTable::default();
        if let ScoreShape::Weighted { terms } = &mut table.archetypes[0].score {
            terms[0].weight = 0.2;
        }
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("The Guardian"));
    }

    #[test]
    fn test_rejects_missing_rule() {
        let mut table = ScoringTable::default();
        table.archetypes.pop();
        assert!(table.validate().is_err());

        let mut table = ScoringTable::default();
        table.love_languages.push(table.love_languages[0].clone());
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_band() {
        let mut table = ScoringTable::default();
        table.love_languages[2].threshold = Threshold::Band {
            low: 0.7,
            high: 0.5,
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_threshold_band_is_open() {
        let band = Threshold::Band {
            low: 0.5,
            high: 0.7,
        };
        assert!(!band.accepts(0.5));
        assert!(band.accepts(0.6));
        assert!(!band.accepts(0.7));
        assert!(!Threshold::Above { value: 0.6 }.accepts(0.6));
    }

    #[test]
    fn test_balance_shape_peaks_at_center() {
        let layout = TraitLayout::standard();
        let shape = ScoreShape::Balance {
            center: 0.5,
            segments: vec![Segment::Attachment, Segment::Conflict, Segment::Cognitive],
        };
        let centered = layout.averages(&[0.5; 32]).unwrap();
        let extreme = layout.averages(&[1.0; 32]).unwrap();
        assert_eq!(shape.score(&centered), 1.0);
        assert_eq!(shape.score(&extreme), -0.5);
    }

    #[test]
    fn test_json_round_trip_keeps_validity() {
        let json = serde_json::to_string(&ScoringTable::default()).unwrap();
        let table = ScoringTable::from_json_str(&json).unwrap();
        assert_eq!(table.version, 1);
        assert!(table.archetype_rule(Archetype::Harmonizer).is_some());
        assert!(table.love_language_rule(LoveLanguage::ReceivingGifts).is_some());
    }
}
