use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::error::{EngineError, Result};

/// Number of dimensions in the standard trait layout
pub const TRAIT_DIMENSIONS: usize = 32;

/// Segment boundaries of the standard layout, one more than the segment count
const STANDARD_BOUNDS: [usize; 8] = [0, 5, 10, 15, 21, 26, 29, 32];

/// One of the seven contiguous regions of a trait vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Attachment,
    Conflict,
    Cognitive,
    Values,
    Social,
    Sexual,
    LifeStructure,
}

impl Segment {
    /// All segments in layout order
    pub const ALL: [Segment; 7] = [
        Segment::Attachment,
        Segment::Conflict,
        Segment::Cognitive,
        Segment::Values,
        Segment::Social,
        Segment::Sexual,
        Segment::LifeStructure,
    ];

    /// Position of this segment within the layout
    pub fn position(self) -> usize {
        self as usize
    }

    /// Category label used by the scenario catalog
    pub fn label(self) -> &'static str {
        match self {
            Segment::Attachment => "Attachment & Regulation",
            Segment::Conflict => "Conflict & Communication",
            Segment::Cognitive => "Cognitive & Decision Style",
            Segment::Values => "Value Architecture",
            Segment::Social => "Social & Interpersonal Style",
            Segment::Sexual => "Sexual System",
            Segment::LifeStructure => "Life Structure",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Dimension count and segment boundaries of a trait vector.
///
/// Serialized as its eight boundaries; deserializing goes through
/// [`TraitLayout::new`], so a stored layout is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[usize; 8]", into = "[usize; 8]")]
pub struct TraitLayout {
    bounds: [usize; 8],
}

impl TryFrom<[usize; 8]> for TraitLayout {
    type Error = EngineError;

    fn try_from(bounds: [usize; 8]) -> Result<Self> {
        Self::new(bounds)
    }
}

impl From<TraitLayout> for [usize; 8] {
    fn from(layout: TraitLayout) -> Self {
        layout.bounds
    }
}

impl TraitLayout {
    /// The 32-dimension layout every scenario catalog and scoring table is written against
    pub fn standard() -> Self {
        Self {
            bounds: STANDARD_BOUNDS,
        }
    }

    /// Build a layout from segment boundaries.
    ///
    /// `bounds[0]` must be 0 and every segment must be non-empty.
    pub fn new(bounds: [usize; 8]) -> Result<Self> {
        if bounds[0] != 0 {
            return Err(EngineError::Layout(format!(
                "first segment must start at 0, got {}",
                bounds[0]
            )));
        }
        for (segment, pair) in Segment::ALL.iter().zip(bounds.windows(2)) {
            if pair[1] <= pair[0] {
                return Err(EngineError::Layout(format!(
                    "segment '{}' is empty or reversed ({}..{})",
                    segment, pair[0], pair[1]
                )));
            }
        }
        Ok(Self { bounds })
    }

    /// Total number of dimensions
    pub fn dimension(&self) -> usize {
        self.bounds[7]
    }

    pub fn range(&self, segment: Segment) -> Range<usize> {
        let i = segment.position();
        self.bounds[i]..self.bounds[i + 1]
    }

    /// Segment that owns a dimension index
    pub fn segment_of(&self, index: usize) -> Option<Segment> {
        Segment::ALL
            .iter()
            .copied()
            .find(|s| self.range(*s).contains(&index))
    }

    /// Borrow one segment of `values`, or `None` when the slice has the wrong length
    pub fn segment<'a>(&self, values: &'a [f64], segment: Segment) -> Option<&'a [f64]> {
        if values.len() != self.dimension() {
            return None;
        }
        values.get(self.range(segment))
    }

    /// Mean of every segment, or `None` when the slice has the wrong length
    pub fn averages(&self, values: &[f64]) -> Option<SegmentAverages> {
        if values.len() != self.dimension() {
            return None;
        }
        let mut means = [0.0; 7];
        for segment in Segment::ALL {
            means[segment.position()] = mean(&values[self.range(segment)]);
        }
        Some(SegmentAverages { means })
    }
}

impl Default for TraitLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Per-segment means of one trait vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentAverages {
    means: [f64; 7],
}

impl SegmentAverages {
    pub fn get(&self, segment: Segment) -> f64 {
        self.means[segment.position()]
    }
}

/// A validated trait vector: correct length, every value finite and in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitVector {
    values: Vec<f64>,
    #[serde(skip)]
    layout: TraitLayout,
}

impl TraitVector {
    pub fn new(values: Vec<f64>, layout: TraitLayout) -> Result<Self> {
        if values.len() != layout.dimension() {
            return Err(EngineError::TraitLength {
                expected: layout.dimension(),
                actual: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(EngineError::TraitValue {
                index,
                value: *value,
            });
        }
        Ok(Self { values, layout })
    }

    /// Validate against the standard 32-dimension layout
    pub fn standard(values: Vec<f64>) -> Result<Self> {
        Self::new(values, TraitLayout::standard())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn layout(&self) -> &TraitLayout {
        &self.layout
    }

    pub fn segment(&self, segment: Segment) -> &[f64] {
        &self.values[self.layout.range(segment)]
    }

    pub fn averages(&self) -> SegmentAverages {
        let mut means = [0.0; 7];
        for segment in Segment::ALL {
            means[segment.position()] = mean(self.segment(segment));
        }
        SegmentAverages { means }
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for TraitVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n, not n - 1)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_segment_ranges() {
        let layout = TraitLayout::standard();
        assert_eq!(layout.dimension(), 32);
        assert_eq!(layout.range(Segment::Attachment), 0..5);
        assert_eq!(layout.range(Segment::Conflict), 5..10);
        assert_eq!(layout.range(Segment::Cognitive), 10..15);
        assert_eq!(layout.range(Segment::Values), 15..21);
        assert_eq!(layout.range(Segment::Social), 21..26);
        assert_eq!(layout.range(Segment::Sexual), 26..29);
        assert_eq!(layout.range(Segment::LifeStructure), 29..32);
    }

    #[test]
    fn test_segments_cover_every_dimension_once() {
        let layout = TraitLayout::standard();
        for index in 0..layout.dimension() {
            let owners = Segment::ALL
                .iter()
                .filter(|s| layout.range(**s).contains(&index))
                .count();
            assert_eq!(owners, 1, "index {} owned by {} segments", index, owners);
        }
        assert_eq!(layout.segment_of(20), Some(Segment::Values));
        assert_eq!(layout.segment_of(32), None);
    }

    #[test]
    fn test_layout_rejects_empty_segment() {
        assert!(TraitLayout::new([0, 5, 5, 15, 21, 26, 29, 32]).is_err());
        assert!(TraitLayout::new([1, 5, 10, 15, 21, 26, 29, 32]).is_err());
        assert!(TraitLayout::new([0, 1, 2, 3, 4, 5, 6, 7]).is_ok());
    }

    #[test]
    fn test_layout_deserialization_is_validated() {
        let layout: TraitLayout = serde_json::from_str("[0, 5, 10, 15, 21, 26, 29, 32]").unwrap();
        assert_eq!(layout, TraitLayout::standard());
        assert_eq!(
            serde_json::to_string(&layout).unwrap(),
            "[0,5,10,15,21,26,29,32]"
        );

        let reversed = serde_json::from_str::<TraitLayout>("[0, 5, 4, 15, 21, 26, 29, 32]");
        assert!(reversed.is_err());
    }

    #[test]
    fn test_segment_view_borrows() {
        let layout = TraitLayout::standard();
        let values: Vec<f64> = (0..32).map(|i| i as f64 / 100.0).collect();
        let view = layout.segment(&values, Segment::Sexual).unwrap();
        assert_eq!(view, &values[26..29]);
        assert!(layout.segment(&values[..31], Segment::Sexual).is_none());
    }

    #[test]
    fn test_averages() {
        let mut values = vec![0.5; 32];
        for v in values.iter_mut().take(5) {
            *v = 1.0;
        }
        let averages = TraitLayout::standard().averages(&values).unwrap();
        assert_eq!(averages.get(Segment::Attachment), 1.0);
        assert_eq!(averages.get(Segment::Values), 0.5);
        assert!(TraitLayout::standard().averages(&values[..10]).is_none());
    }

    #[test]
    fn test_trait_vector_validation() {
        assert!(TraitVector::standard(vec![0.5; 32]).is_ok());
        assert!(matches!(
            TraitVector::standard(vec![0.5; 31]),
            Err(EngineError::TraitLength { expected: 32, actual: 31 })
        ));

        let mut values = vec![0.5; 32];
        values[7] = 1.2;
        assert!(matches!(
            TraitVector::standard(values),
            Err(EngineError::TraitValue { index: 7, .. })
        ));

        let mut values = vec![0.5; 32];
        values[3] = f64::NAN;
        assert!(TraitVector::standard(values).is_err());
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(population_std_dev(&[0.5, 0.5, 0.5]), 0.0);
        let sd = population_std_dev(&[0.0, 1.0]);
        assert!((sd - 0.5).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }
}
