use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::Result;
use super::profile::DerivedProfile;
use super::scoring::ScoringTable;
use super::traits::{mean, population_std_dev, TraitLayout};

/// Dominant trait pattern of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Guardian,
    Explorer,
    Nurturer,
    Visionary,
    Harmonizer,
    Catalyst,
    Anchor,
    FreeSpirit,
}

impl Archetype {
    /// Declaration order; earlier archetypes win score ties
    pub const ALL: [Archetype; 8] = [
        Archetype::Guardian,
        Archetype::Explorer,
        Archetype::Nurturer,
        Archetype::Visionary,
        Archetype::Harmonizer,
        Archetype::Catalyst,
        Archetype::Anchor,
        Archetype::FreeSpirit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Archetype::Guardian => "The Guardian",
            Archetype::Explorer => "The Explorer",
            Archetype::Nurturer => "The Nurturer",
            Archetype::Visionary => "The Visionary",
            Archetype::Harmonizer => "The Harmonizer",
            Archetype::Catalyst => "The Catalyst",
            Archetype::Anchor => "The Anchor",
            Archetype::FreeSpirit => "The Free Spirit",
        }
    }

    /// Stable identifier used in reference data and JSON
    pub fn id(self) -> &'static str {
        match self {
            Archetype::Guardian => "guardian",
            Archetype::Explorer => "explorer",
            Archetype::Nurturer => "nurturer",
            Archetype::Visionary => "visionary",
            Archetype::Harmonizer => "harmonizer",
            Archetype::Catalyst => "catalyst",
            Archetype::Anchor => "anchor",
            Archetype::FreeSpirit => "free_spirit",
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Archetype::ALL
            .iter()
            .copied()
            .find(|a| {
                a.id() == wanted
                    || a.label().to_lowercase() == wanted
                    || a.label().to_lowercase().trim_start_matches("the ") == wanted
            })
            .ok_or_else(|| format!("Unknown archetype: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStyle {
    Secure,
    Anxious,
    Avoidant,
    Disorganized,
}

impl std::fmt::Display for AttachmentStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachmentStyle::Secure => write!(f, "Secure"),
            AttachmentStyle::Anxious => write!(f, "Anxious"),
            AttachmentStyle::Avoidant => write!(f, "Avoidant"),
            AttachmentStyle::Disorganized => write!(f, "Disorganized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoveLanguage {
    WordsOfAffirmation,
    ActsOfService,
    ReceivingGifts,
    QualityTime,
    PhysicalTouch,
}

impl LoveLanguage {
    /// Evaluation order, which is also the priority order when more than three qualify
    pub const ALL: [LoveLanguage; 5] = [
        LoveLanguage::WordsOfAffirmation,
        LoveLanguage::ActsOfService,
        LoveLanguage::ReceivingGifts,
        LoveLanguage::QualityTime,
        LoveLanguage::PhysicalTouch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LoveLanguage::WordsOfAffirmation => "Words of Affirmation",
            LoveLanguage::ActsOfService => "Acts of Service",
            LoveLanguage::ReceivingGifts => "Receiving Gifts",
            LoveLanguage::QualityTime => "Quality Time",
            LoveLanguage::PhysicalTouch => "Physical Touch",
        }
    }
}

impl std::fmt::Display for LoveLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Maximum number of love languages reported
pub const MAX_LOVE_LANGUAGES: usize = 3;

/// Archetype returned when the vector has the wrong length
pub const DEFAULT_ARCHETYPE: Archetype = Archetype::Harmonizer;
/// Attachment style returned when the vector has the wrong length
pub const DEFAULT_ATTACHMENT_STYLE: AttachmentStyle = AttachmentStyle::Secure;
/// Love language reported when none crosses its threshold
pub const DEFAULT_LOVE_LANGUAGE: LoveLanguage = LoveLanguage::QualityTime;

/// Maps trait vectors to derived labels.
///
/// Every entry point takes a raw slice: a slice whose length differs from
/// the layout dimension gets a fixed fallback instead of an error, so
/// callers can always render something.
#[derive(Debug, Clone)]
pub struct TraitClassifier {
    table: ScoringTable,
    layout: TraitLayout,
}

impl TraitClassifier {
    pub fn new(table: ScoringTable, layout: TraitLayout) -> Result<Self> {
        table.validate()?;
        Ok(Self { table, layout })
    }

    /// Built-in scoring table over the 32-dimension layout
    pub fn standard() -> Self {
        Self {
            table: ScoringTable::default(),
            layout: TraitLayout::standard(),
        }
    }

    pub fn layout(&self) -> &TraitLayout {
        &self.layout
    }

    pub fn table(&self) -> &ScoringTable {
        &self.table
    }

    /// Score of every archetype in declaration order, or `None` on a malformed vector
    pub fn archetype_scores(&self, traits: &[f64]) -> Option<Vec<(Archetype, f64)>> {
        let averages = self.layout.averages(traits)?;
        Some(
            Archetype::ALL
                .iter()
                .filter_map(|archetype| {
                    self.table
                        .archetype_rule(*archetype)
                        .map(|rule| (*archetype, rule.score.score(&averages)))
                })
                .collect(),
        )
    }

    pub fn classify_archetype(&self, traits: &[f64]) -> Archetype {
        let Some(scores) = self.archetype_scores(traits) else {
            debug!(
                "Archetype fallback: {} traits, expected {}",
                traits.len(),
                self.layout.dimension()
            );
            return DEFAULT_ARCHETYPE;
        };

        let mut best = DEFAULT_ARCHETYPE;
        let mut best_score = -1.0;
        for (archetype, score) in scores {
            if score > best_score {
                best_score = score;
                best = archetype;
            }
        }
        best
    }

    pub fn classify_attachment_style(&self, traits: &[f64]) -> AttachmentStyle {
        let thresholds = &self.table.attachment;
        let Some(segment) = self.layout.segment(traits, thresholds.segment) else {
            debug!("Attachment fallback: {} traits", traits.len());
            return DEFAULT_ATTACHMENT_STYLE;
        };

        let avg = mean(segment);
        let std_dev = population_std_dev(segment);

        if std_dev > thresholds.disorganized_std_dev {
            AttachmentStyle::Disorganized
        } else if avg < thresholds.avoidant_below {
            AttachmentStyle::Avoidant
        } else if avg > thresholds.anxious_above {
            AttachmentStyle::Anxious
        } else {
            AttachmentStyle::Secure
        }
    }

    /// Qualifying love languages in evaluation order, at most three.
    ///
    /// Unlike the other classifiers a malformed vector yields an empty list,
    /// not a default label.
    pub fn classify_love_languages(&self, traits: &[f64]) -> Vec<LoveLanguage> {
        let Some(averages) = self.layout.averages(traits) else {
            debug!("Love language fallback: {} traits", traits.len());
            return Vec::new();
        };

        let mut languages: Vec<LoveLanguage> = LoveLanguage::ALL
            .iter()
            .copied()
            .filter(|language| {
                self.table
                    .love_language_rule(*language)
                    .map(|rule| rule.threshold.accepts(rule.score(&averages)))
                    .unwrap_or(false)
            })
            .collect();

        if languages.is_empty() {
            languages.push(DEFAULT_LOVE_LANGUAGE);
        }
        languages.truncate(MAX_LOVE_LANGUAGES);
        languages
    }

    pub fn classify(&self, traits: &[f64]) -> DerivedProfile {
        DerivedProfile {
            archetype: self.classify_archetype(traits),
            attachment_style: self.classify_attachment_style(traits),
            love_languages: self.classify_love_languages(traits),
        }
    }
}

impl Default for TraitClassifier {
    fn default() -> Self {
        Self::standard()
    }
}
