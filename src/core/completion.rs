use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::catalog::ScenarioCatalog;

/// Neutral response value. It is also a legitimate answer, which is why
/// completeness is decided by the answered-index set rather than by value.
pub const SENTINEL: f64 = 0.5;

/// Chapter and category context for one unanswered index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnansweredScenario {
    pub index: usize,
    pub chapter: String,
    pub category: String,
}

/// Unanswered indices of one chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterGap {
    pub chapter: String,
    pub indices: Vec<usize>,
}

/// A present response outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutOfRange {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub total_scenarios: usize,
    pub answered_count: usize,
    /// Sorted, no duplicates
    pub unanswered_indices: Vec<usize>,
    pub unanswered_scenarios: Vec<UnansweredScenario>,
    /// Gaps grouped by chapter, in catalog chapter order
    pub unanswered_by_chapter: Vec<ChapterGap>,
    pub array_size_correct: bool,
    pub can_complete: bool,
    pub out_of_range: Vec<OutOfRange>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Result of the pre-submission gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Backfilled copies of a response array and its confidence scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFill {
    pub responses: Vec<f64>,
    pub confidence_scores: Vec<f64>,
    pub filled_count: usize,
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Checks response arrays against a scenario catalog.
///
/// Every method is a pure function of its arguments and the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CompletionAnalyzer<'a> {
    catalog: &'a ScenarioCatalog,
}

impl<'a> CompletionAnalyzer<'a> {
    pub fn new(catalog: &'a ScenarioCatalog) -> Self {
        Self { catalog }
    }

    pub fn total_scenarios(&self) -> usize {
        self.catalog.len()
    }

    /// Build a completion report.
    ///
    /// With `answered` the set alone decides completeness. Without it, only
    /// missing entries count as unanswered, so an unfilled slot that holds
    /// the sentinel is indistinguishable from a neutral answer.
    pub fn analyze(
        &self,
        responses: &[Option<f64>],
        answered: Option<&BTreeSet<usize>>,
    ) -> CompletionReport {
        let total = self.total_scenarios();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let array_size_correct = responses.len() == total;
        if !array_size_correct {
            issues.push(format!(
                "Response array size mismatch: {} vs {}",
                responses.len(),
                total
            ));
            recommendations
                .push("Response array should be resized to match the scenario count".to_string());
        }

        let mut unanswered: BTreeSet<usize> = (responses.len().min(total)..total).collect();
        match answered {
            Some(set) => {
                unanswered.extend((0..total).filter(|i| !set.contains(i)));
            }
            None => {
                unanswered.extend(
                    responses
                        .iter()
                        .take(total)
                        .enumerate()
                        .filter(|(_, r)| r.is_none())
                        .map(|(i, _)| i),
                );
            }
        }
        let unanswered_indices: Vec<usize> = unanswered.into_iter().collect();
        let answered_count = total - unanswered_indices.len();

        let out_of_range: Vec<OutOfRange> = responses
            .iter()
            .enumerate()
            .filter_map(|(index, r)| r.map(|value| OutOfRange { index, value }))
            .filter(|o| o.value != SENTINEL && !(0.0..=1.0).contains(&o.value))
            .collect();
        for o in &out_of_range {
            issues.push(format!(
                "Invalid response value at index {}: {} (should be 0-1)",
                o.index, o.value
            ));
        }

        // Every unanswered index is below N, so each one has a catalog entry
        let unanswered_scenarios: Vec<UnansweredScenario> = unanswered_indices
            .iter()
            .filter_map(|&index| self.catalog.get(index))
            .map(|s| UnansweredScenario {
                index: s.index,
                chapter: s.chapter.clone(),
                category: s.category.clone(),
            })
            .collect();
        let unanswered_by_chapter = self.group_by_chapter(&unanswered_scenarios);

        let can_complete = array_size_correct && unanswered_indices.is_empty();

        if !can_complete {
            if !unanswered_indices.is_empty() {
                let count = unanswered_indices.len();
                recommendations.push(format!(
                    "Answer {} remaining scenario{}",
                    count,
                    plural(count)
                ));
                for gap in &unanswered_by_chapter {
                    let n = gap.indices.len();
                    let list: Vec<String> = gap.indices.iter().map(|i| i.to_string()).collect();
                    recommendations.push(format!(
                        "  - {}: {} scenario(s) at index{} {}",
                        gap.chapter,
                        n,
                        if n == 1 { "" } else { "es" },
                        list.join(", ")
                    ));
                }
            }
            if !array_size_correct {
                recommendations.push("Fix array size mismatch before proceeding".to_string());
            }
        }

        CompletionReport {
            total_scenarios: total,
            answered_count,
            unanswered_indices,
            unanswered_scenarios,
            unanswered_by_chapter,
            array_size_correct,
            can_complete,
            out_of_range,
            issues,
            recommendations,
        }
    }

    fn group_by_chapter(&self, scenarios: &[UnansweredScenario]) -> Vec<ChapterGap> {
        let mut gaps: Vec<ChapterGap> = self
            .catalog
            .chapters()
            .into_iter()
            .map(|chapter| ChapterGap {
                chapter: chapter.to_string(),
                indices: Vec::new(),
            })
            .collect();

        for scenario in scenarios {
            match gaps.iter_mut().find(|g| g.chapter == scenario.chapter) {
                Some(gap) => gap.indices.push(scenario.index),
                None => gaps.push(ChapterGap {
                    chapter: scenario.chapter.clone(),
                    indices: vec![scenario.index],
                }),
            }
        }

        gaps.retain(|g| !g.indices.is_empty());
        gaps
    }

    /// Pre-submission gate using the value-based signal
    pub fn validate(&self, responses: &[Option<f64>]) -> Validation {
        let report = self.analyze(responses, None);
        let mut errors = Vec::new();

        if !report.array_size_correct {
            errors.push(format!(
                "Array size mismatch: expected {}, got {}",
                report.total_scenarios,
                responses.len()
            ));
        }

        if !report.unanswered_indices.is_empty() {
            let list: Vec<String> = report
                .unanswered_indices
                .iter()
                .map(|i| i.to_string())
                .collect();
            errors.push(format!(
                "{} scenario(s) unanswered: {}",
                report.unanswered_indices.len(),
                list.join(", ")
            ));
        }

        errors.extend(report.issues.iter().cloned());

        Validation {
            valid: report.can_complete && errors.is_empty(),
            errors,
        }
    }

    /// Pad both arrays to the scenario count and write the sentinel into
    /// every missing or sentinel-valued slot.
    ///
    /// Genuine 0.5 answers are indistinguishable from gaps here, so they are
    /// counted as filled on every call.
    pub fn auto_fill(&self, responses: &[Option<f64>], confidence_scores: &[f64]) -> AutoFill {
        let total = self.total_scenarios();

        let mut filled: Vec<Option<f64>> = responses.to_vec();
        if filled.len() < total {
            filled.resize(total, Some(SENTINEL));
        }
        let mut confidence = confidence_scores.to_vec();
        if confidence.len() < filled.len() {
            confidence.resize(filled.len(), SENTINEL);
        }

        let mut filled_count = 0;
        for (index, response) in filled.iter_mut().enumerate() {
            if response.map_or(true, |v| v == SENTINEL) {
                *response = Some(SENTINEL);
                confidence[index] = SENTINEL;
                filled_count += 1;
            }
        }

        AutoFill {
            responses: filled.into_iter().map(|r| r.unwrap_or(SENTINEL)).collect(),
            confidence_scores: confidence,
            filled_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{ScenarioCatalog, ScenarioChoice, ScenarioDefinition};

    fn catalog() -> ScenarioCatalog {
        ScenarioCatalog::bundled().unwrap()
    }

    fn alternating(len: usize) -> Vec<Option<f64>> {
        (0..len)
            .map(|i| Some(if i % 2 == 0 { 0.7 } else { 0.3 }))
            .collect()
    }

    #[test]
    fn test_all_answered() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let report = analyzer.analyze(&alternating(32), None);

        assert!(report.can_complete);
        assert!(report.array_size_correct);
        assert_eq!(report.answered_count, 32);
        assert!(report.unanswered_indices.is_empty());
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_truncated_array() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let responses = alternating(31);

        let report = analyzer.analyze(&responses, None);
        assert!(!report.array_size_correct);
        assert!(!report.can_complete);
        assert_eq!(report.unanswered_indices, vec![31]);
        assert_eq!(report.answered_count, 31);

        // Even when the answered set claims index 31, the array does not reach it
        let all: BTreeSet<usize> = (0..32).collect();
        let report = analyzer.analyze(&responses, Some(&all));
        assert_eq!(report.unanswered_indices, vec![31]);
        assert_eq!(report.answered_count + report.unanswered_indices.len(), 32);
    }

    #[test]
    fn test_answered_set_resolves_neutral_answers() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let responses = vec![Some(SENTINEL); 32];

        let all: BTreeSet<usize> = (0..32).collect();
        let report = analyzer.analyze(&responses, Some(&all));
        assert!(report.can_complete);
        assert_eq!(report.answered_count, 32);

        let mut partial = all.clone();
        partial.remove(&3);
        partial.remove(&17);
        let report = analyzer.analyze(&responses, Some(&partial));
        assert!(!report.can_complete);
        assert_eq!(report.unanswered_indices, vec![3, 17]);
    }

    #[test]
    fn test_answered_set_ignores_values() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(32);
        responses[5] = None;

        // The set is authoritative: index 5 is answered even though its slot is empty
        let all: BTreeSet<usize> = (0..32).collect();
        assert!(analyzer.analyze(&responses, Some(&all)).can_complete);

        let empty = BTreeSet::new();
        let report = analyzer.analyze(&responses, Some(&empty));
        assert_eq!(report.answered_count, 0);
        assert_eq!(report.unanswered_indices.len(), 32);
    }

    #[test]
    fn test_fallback_treats_missing_as_unanswered() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = vec![Some(SENTINEL); 32];
        responses[0] = None;
        responses[9] = None;

        let report = analyzer.analyze(&responses, None);
        assert_eq!(report.unanswered_indices, vec![0, 9]);
        assert_eq!(report.answered_count, 30);
    }

    #[test]
    fn test_counts_always_add_up() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let answered: BTreeSet<usize> = [0, 1, 2, 40, 99].into_iter().collect();

        for len in [0, 1, 16, 31, 32, 33, 40] {
            let mut responses = alternating(len);
            if len > 4 {
                responses[4] = None;
            }
            for set in [None, Some(&answered)] {
                let report = analyzer.analyze(&responses, set);
                assert_eq!(
                    report.answered_count + report.unanswered_indices.len(),
                    32,
                    "len {} set {:?}",
                    len,
                    set.is_some()
                );
                assert!(report.unanswered_indices.iter().all(|i| *i < 32));
                assert!(report.unanswered_indices.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_out_of_range_is_reported_not_unanswered() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(32);
        responses[2] = Some(1.4);
        responses[8] = Some(-0.1);

        let report = analyzer.analyze(&responses, None);
        assert_eq!(report.answered_count, 32);
        assert!(report.can_complete);
        assert_eq!(report.out_of_range.len(), 2);
        assert_eq!(report.out_of_range[0].index, 2);
        assert!(report.issues[0].contains("index 2"));

        let validation = analyzer.validate(&responses);
        assert!(!validation.valid);
        assert_eq!(validation.errors.len(), 2);
    }

    #[test]
    fn test_unanswered_grouped_by_chapter() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let answered: BTreeSet<usize> = (0..32).filter(|i| ![1, 3, 30].contains(i)).collect();

        let report = analyzer.analyze(&alternating(32), Some(&answered));
        assert_eq!(report.unanswered_by_chapter.len(), 2);
        assert_eq!(report.unanswered_by_chapter[0].chapter, "Chapter 1: The First Meeting");
        assert_eq!(report.unanswered_by_chapter[0].indices, vec![1, 3]);
        assert_eq!(report.unanswered_by_chapter[1].indices, vec![30]);
        assert_eq!(report.unanswered_scenarios[2].category, "Life Structure");
        assert_eq!(report.recommendations[0], "Answer 3 remaining scenarios");
        assert_eq!(
            report.recommendations[1],
            "  - Chapter 1: The First Meeting: 2 scenario(s) at indexes 1, 3"
        );
    }

    #[test]
    fn test_validate() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);

        let ok = analyzer.validate(&alternating(32));
        assert!(ok.valid);
        assert!(ok.errors.is_empty());

        let mut responses = alternating(30);
        responses[0] = None;
        let bad = analyzer.validate(&responses);
        assert!(!bad.valid);
        assert_eq!(
            bad.errors,
            vec![
                "Array size mismatch: expected 32, got 30".to_string(),
                "3 scenario(s) unanswered: 0, 30, 31".to_string(),
                "Response array size mismatch: 30 vs 32".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_carries_every_report_issue() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(33);
        responses[1] = Some(7.0);

        let report = analyzer.analyze(&responses, None);
        let validation = analyzer.validate(&responses);
        assert!(!validation.valid);
        for issue in &report.issues {
            assert!(validation.errors.contains(issue), "missing {:?}", issue);
        }
        assert_eq!(validation.errors.len(), 1 + report.issues.len());
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(32);
        responses[12] = Some(f64::NAN);

        let report = analyzer.analyze(&responses, None);
        assert_eq!(report.answered_count, 32);
        assert_eq!(report.out_of_range.len(), 1);
        assert_eq!(report.out_of_range[0].index, 12);
        assert!(report.out_of_range[0].value.is_nan());
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("index 12"));
        assert!(!analyzer.validate(&responses).valid);
    }

    #[test]
    fn test_auto_fill_pads_and_fills() {
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(30);
        responses[4] = None;
        let confidence = vec![0.9; 10];

        let result = analyzer.auto_fill(&responses, &confidence);
        assert_eq!(result.responses.len(), 32);
        assert_eq!(result.confidence_scores.len(), 32);
        assert_eq!(result.filled_count, 3);
        assert_eq!(result.responses[4], SENTINEL);
        assert_eq!(result.confidence_scores[4], SENTINEL);
        assert_eq!(result.confidence_scores[3], 0.9);
        assert_eq!(result.responses[31], SENTINEL);

        // Inputs are untouched
        assert_eq!(responses.len(), 30);
        assert_eq!(responses[4], None);
    }

    #[test]
    fn test_auto_fill_refills_sentinel_answers() {
        // Known limitation: a genuine 0.5 answer cannot be told apart from a
        // gap by value, so it is "filled" again on every call
        let catalog = catalog();
        let analyzer = CompletionAnalyzer::new(&catalog);
        let mut responses = alternating(32);
        responses[6] = None;

        let first = analyzer.auto_fill(&responses, &[]);
        assert_eq!(first.filled_count, 1);

        let again: Vec<Option<f64>> = first.responses.iter().copied().map(Some).collect();
        let second = analyzer.auto_fill(&again, &first.confidence_scores);
        assert_eq!(second.filled_count, 1);
        assert_eq!(second.responses, first.responses);

        let distinct = analyzer.auto_fill(&alternating(32), &[]);
        let rerun: Vec<Option<f64>> = distinct.responses.iter().copied().map(Some).collect();
        assert_eq!(distinct.filled_count, 0);
        assert_eq!(analyzer.auto_fill(&rerun, &distinct.confidence_scores).filled_count, 0);
    }

    #[test]
    fn test_single_scenario_catalog() {
        let catalog = ScenarioCatalog::from_definitions(vec![ScenarioDefinition {
            index: 0,
            chapter: "Only".to_string(),
            category: "Solo".to_string(),
            dimension: String::new(),
            story_text: String::new(),
            choices: vec![ScenarioChoice {
                text: "x".to_string(),
                value: 0.1,
            }],
        }])
        .unwrap();
        let analyzer = CompletionAnalyzer::new(&catalog);

        let report = analyzer.analyze(&[], None);
        assert_eq!(report.unanswered_indices, vec![0]);
        assert_eq!(report.unanswered_scenarios[0].category, "Solo");
        assert_eq!(report.unanswered_by_chapter[0].chapter, "Only");

        let longer = analyzer.analyze(&[Some(0.1), None, Some(2.0)], None);
        assert!(!longer.array_size_correct);
        assert_eq!(longer.answered_count, 1);
        assert_eq!(longer.out_of_range.len(), 1);
    }
}
