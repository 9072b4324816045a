use serde::{Deserialize, Serialize};

use super::classifier::{Archetype, AttachmentStyle, LoveLanguage};
use super::traits::{Segment, TraitLayout};

/// Labels derived from one finalized trait vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedProfile {
    pub archetype: Archetype,
    pub attachment_style: AttachmentStyle,
    /// Qualifying love languages in priority order (at most three)
    pub love_languages: Vec<LoveLanguage>,
}

impl DerivedProfile {
    /// Reference description of the derived archetype
    pub fn archetype_profile(&self) -> ArchetypeProfile {
        ArchetypeProfile::for_archetype(self.archetype)
    }

    pub fn love_language_labels(&self) -> Vec<&'static str> {
        self.love_languages.iter().map(|l| l.label()).collect()
    }
}

/// Display metadata for one archetype
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub strengths: &'static [&'static str],
    pub challenges: &'static [&'static str],
    pub ideal_matches: [Archetype; 3],
    /// Attachment style typical of this archetype
    pub attachment_style: AttachmentStyle,
    pub love_languages: &'static [LoveLanguage],
    /// Typical mean per segment, in layout order
    pub segment_means: [f64; 7],
}

struct ReferenceData {
    description: &'static str,
    strengths: &'static [&'static str],
    challenges: &'static [&'static str],
    ideal_matches: [Archetype; 3],
    attachment_style: AttachmentStyle,
    love_languages: &'static [LoveLanguage],
    segment_means: [f64; 7],
}

impl ArchetypeProfile {
    pub fn for_archetype(archetype: Archetype) -> Self {
        use Archetype::*;
        use LoveLanguage::*;

        let data = match archetype {
            Guardian => ReferenceData {
                description:
                    "Stable, reliable, and protective. Values security, tradition, and long-term commitment.",
                strengths: &[
                    "Reliable and consistent",
                    "Strong sense of responsibility",
                    "Excellent at creating stability",
                    "Protective and caring",
                ],
                challenges: &[
                    "May be resistant to change",
                    "Can be overly cautious",
                    "Might struggle with spontaneity",
                ],
                ideal_matches: [Explorer, FreeSpirit, Visionary],
                attachment_style: AttachmentStyle::Secure,
                love_languages: &[ActsOfService, QualityTime, PhysicalTouch],
                segment_means: [0.75, 0.35, 0.65, 0.70, 0.60, 0.65, 0.80],
            },
            Explorer => ReferenceData {
                description:
                    "Adventurous, independent, and free-spirited. Values freedom, new experiences, and personal growth.",
                strengths: &[
                    "Spontaneous and exciting",
                    "Open to new experiences",
                    "Independent and self-reliant",
                    "Brings adventure to relationships",
                ],
                challenges: &[
                    "May struggle with commitment",
                    "Can be emotionally distant",
                    "Might avoid deep conversations",
                ],
                ideal_matches: [Guardian, Nurturer, Anchor],
                attachment_style: AttachmentStyle::Avoidant,
                love_languages: &[QualityTime, PhysicalTouch, WordsOfAffirmation],
                segment_means: [0.25, 0.30, 0.75, 0.40, 0.70, 0.65, 0.20],
            },
            Nurturer => ReferenceData {
                description:
                    "Caring, empathetic, and supportive. Values emotional connection, harmony, and helping others.",
                strengths: &[
                    "Highly empathetic and caring",
                    "Excellent at emotional support",
                    "Creates harmony and peace",
                    "Strong communication skills",
                ],
                challenges: &[
                    "May prioritize others over self",
                    "Can struggle with boundaries",
                    "Might avoid conflict",
                ],
                ideal_matches: [Explorer, Visionary, Catalyst],
                attachment_style: AttachmentStyle::Secure,
                love_languages: &[WordsOfAffirmation, ActsOfService, QualityTime],
                segment_means: [0.65, 0.25, 0.55, 0.70, 0.80, 0.70, 0.60],
            },
            Visionary => ReferenceData {
                description:
                    "Innovative, idealistic, and forward-thinking. Values growth, purpose, and making a difference.",
                strengths: &[
                    "Creative and innovative",
                    "Strong sense of purpose",
                    "Excellent at long-term planning",
                    "Inspiring and motivating",
                ],
                challenges: &[
                    "May be overly idealistic",
                    "Can struggle with practical details",
                    "Might prioritize goals over relationships",
                ],
                ideal_matches: [Nurturer, Anchor, Guardian],
                attachment_style: AttachmentStyle::Secure,
                love_languages: &[WordsOfAffirmation, QualityTime, ActsOfService],
                segment_means: [0.60, 0.45, 0.80, 0.85, 0.55, 0.50, 0.65],
            },
            Harmonizer => ReferenceData {
                description:
                    "Balanced, adaptable, and harmonious. Values connection, growth, and finding middle ground.",
                strengths: &[
                    "Highly adaptable",
                    "Excellent at compromise",
                    "Creates harmony",
                    "Balanced approach to life",
                ],
                challenges: &[
                    "May struggle with strong opinions",
                    "Can be indecisive",
                    "Might avoid taking strong stands",
                ],
                ideal_matches: [Catalyst, Visionary, Explorer],
                attachment_style: AttachmentStyle::Secure,
                love_languages: &[
                    WordsOfAffirmation,
                    ActsOfService,
                    QualityTime,
                    PhysicalTouch,
                    ReceivingGifts,
                ],
                segment_means: [0.55, 0.45, 0.52, 0.58, 0.55, 0.53, 0.52],
            },
            Catalyst => ReferenceData {
                description:
                    "Passionate, driven, and change-oriented. Values growth, authenticity, and pushing boundaries.",
                strengths: &[
                    "Passionate and intense",
                    "Drives growth and change",
                    "Authentic and honest",
                    "Strong convictions",
                ],
                challenges: &[
                    "May create conflict",
                    "Can be emotionally intense",
                    "Might struggle with compromise",
                ],
                ideal_matches: [Harmonizer, Nurturer, Guardian],
                attachment_style: AttachmentStyle::Anxious,
                love_languages: &[WordsOfAffirmation, QualityTime, PhysicalTouch],
                segment_means: [0.40, 0.75, 0.65, 0.80, 0.60, 0.65, 0.50],
            },
            Anchor => ReferenceData {
                description:
                    "Stable, practical, and dependable. Values structure, reliability, and getting things done.",
                strengths: &[
                    "Highly reliable and dependable",
                    "Excellent at organization",
                    "Provides stability",
                    "Practical and grounded",
                ],
                challenges: &[
                    "May be resistant to change",
                    "Can be overly rigid",
                    "Might struggle with spontaneity",
                ],
                ideal_matches: [FreeSpirit, Explorer, Visionary],
                attachment_style: AttachmentStyle::Secure,
                love_languages: &[ActsOfService, ReceivingGifts, QualityTime],
                segment_means: [0.70, 0.40, 0.60, 0.55, 0.50, 0.55, 0.85],
            },
            FreeSpirit => ReferenceData {
                description:
                    "Spontaneous, social, and unconstrained. Values freedom, fun, and living in the moment.",
                strengths: &[
                    "Fun and spontaneous",
                    "Highly social and engaging",
                    "Brings energy and excitement",
                    "Open-minded and flexible",
                ],
                challenges: &[
                    "May struggle with routine",
                    "Can be unreliable",
                    "Might avoid commitment",
                ],
                ideal_matches: [Anchor, Guardian, Nurturer],
                attachment_style: AttachmentStyle::Avoidant,
                love_languages: &[QualityTime, PhysicalTouch, WordsOfAffirmation],
                segment_means: [0.30, 0.40, 0.70, 0.45, 0.85, 0.70, 0.15],
            },
        };

        Self {
            archetype,
            id: archetype.id(),
            name: archetype.label(),
            description: data.description,
            strengths: data.strengths,
            challenges: data.challenges,
            ideal_matches: data.ideal_matches,
            attachment_style: data.attachment_style,
            love_languages: data.love_languages,
            segment_means: data.segment_means,
        }
    }

    /// Every archetype in declaration order
    pub fn all() -> Vec<Self> {
        Archetype::ALL.iter().map(|a| Self::for_archetype(*a)).collect()
    }

    /// Expand the per-segment means into a full trait vector for `layout`
    pub fn reference_traits(&self, layout: &TraitLayout) -> Vec<f64> {
        let mut traits = vec![0.5; layout.dimension()];
        for segment in Segment::ALL {
            let value = self.segment_means[segment.position()];
            for i in layout.range(segment) {
                traits[i] = value;
            }
        }
        traits
    }

    pub fn is_ideal_match(&self, other: Archetype) -> bool {
        self.ideal_matches.contains(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::TraitClassifier;

    #[test]
    fn test_every_archetype_has_a_profile() {
        let profiles = ArchetypeProfile::all();
        assert_eq!(profiles.len(), 8);
        for profile in &profiles {
            assert!(!profile.description.is_empty());
            assert!(!profile.strengths.is_empty());
            assert!(!profile.challenges.is_empty());
            assert!(!profile.ideal_matches.contains(&profile.archetype));
        }
    }

    #[test]
    fn test_reference_traits_shape() {
        let layout = TraitLayout::standard();
        let traits = ArchetypeProfile::for_archetype(Archetype::Anchor).reference_traits(&layout);
        assert_eq!(traits.len(), 32);
        assert_eq!(traits[0], 0.70);
        assert_eq!(traits[31], 0.85);
        assert!(traits.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_reference_traits_classify_cleanly() {
        // Reference vectors are descriptive; only the distinctive ones are
        // expected to classify back to themselves
        let classifier = TraitClassifier::standard();
        let layout = TraitLayout::standard();
        for archetype in [Archetype::Explorer, Archetype::Anchor, Archetype::FreeSpirit] {
            let traits = ArchetypeProfile::for_archetype(archetype).reference_traits(&layout);
            assert_eq!(classifier.classify_archetype(&traits), archetype);
        }
    }

    #[test]
    fn test_derived_profile_labels() {
        let profile = DerivedProfile {
            archetype: Archetype::Catalyst,
            attachment_style: AttachmentStyle::Anxious,
            love_languages: vec![LoveLanguage::WordsOfAffirmation, LoveLanguage::PhysicalTouch],
        };
        assert_eq!(profile.love_language_labels(), vec!["Words of Affirmation", "Physical Touch"]);
        assert_eq!(profile.archetype_profile().name, "The Catalyst");
        assert!(profile.archetype_profile().is_ideal_match(Archetype::Harmonizer));
    }
}
