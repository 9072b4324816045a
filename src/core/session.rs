use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::catalog::ScenarioCatalog;
use super::completion::{CompletionAnalyzer, CompletionReport, SENTINEL};
use super::error::{EngineError, Result};
use super::traits::{TraitLayout, TraitVector};

/// How many unanswered scenarios may remain for auto-fill on the last scenario
pub const DEFAULT_AUTO_FILL_MARGIN: usize = 4;

/// Answers collected during one StoryQuest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseState {
    pub session_id: String,
    pub responses: Vec<Option<f64>>,
    pub confidence_scores: Vec<f64>,
    /// Authoritative record of which scenarios were answered
    pub answered: BTreeSet<usize>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResponseState {
    pub fn new(total: usize) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            responses: vec![None; total],
            confidence_scores: vec![SENTINEL; total],
            answered: BTreeSet::new(),
            started_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// One respondent's pass through a scenario catalog
#[derive(Debug)]
pub struct AssessmentSession<'a> {
    catalog: &'a ScenarioCatalog,
    state: ResponseState,
    auto_fill_margin: usize,
}

impl<'a> AssessmentSession<'a> {
    pub fn new(catalog: &'a ScenarioCatalog) -> Self {
        Self::with_margin(catalog, DEFAULT_AUTO_FILL_MARGIN)
    }

    pub fn with_margin(catalog: &'a ScenarioCatalog, auto_fill_margin: usize) -> Self {
        let state = ResponseState::new(catalog.len());
        debug!(
            "Session {} started with {} scenarios",
            state.session_id,
            catalog.len()
        );
        Self {
            catalog,
            state,
            auto_fill_margin,
        }
    }

    /// Resume from a saved state.
    ///
    /// Both arrays are fitted to the catalog: short ones are padded, entries
    /// past the last scenario are dropped, as are answered indices outside
    /// the catalog.
    pub fn resume(
        catalog: &'a ScenarioCatalog,
        mut state: ResponseState,
        auto_fill_margin: usize,
    ) -> Self {
        let total = catalog.len();
        if state.responses.len() > total {
            warn!(
                "Session {}: dropping {} response(s) past scenario {}",
                state.session_id,
                state.responses.len() - total,
                catalog.last_index()
            );
        }
        state.responses.resize(total, None);
        state.confidence_scores.resize(total, SENTINEL);
        state.answered.retain(|i| *i < total);
        Self {
            catalog,
            state,
            auto_fill_margin,
        }
    }

    pub fn state(&self) -> &ResponseState {
        &self.state
    }

    pub fn into_state(self) -> ResponseState {
        self.state
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.catalog.len() {
            return Err(EngineError::ScenarioIndex {
                index,
                max: self.catalog.last_index(),
            });
        }
        Ok(())
    }

    /// Record the choice picked for a scenario and return its value
    pub fn record_choice(&mut self, index: usize, choice: usize) -> Result<f64> {
        self.check_index(index)?;
        let value = self
            .catalog
            .get(index)
            .and_then(|s| s.choices.get(choice))
            .map(|c| c.value)
            .ok_or(EngineError::ChoiceIndex { index, choice })?;
        self.record_value(index, value)?;
        Ok(value)
    }

    /// Record a raw value; the scenario counts as answered even when the value is 0.5
    pub fn record_value(&mut self, index: usize, value: f64) -> Result<()> {
        self.check_index(index)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(EngineError::ResponseValue { index, value });
        }
        self.state.responses[index] = Some(value);
        self.state.answered.insert(index);
        self.state.touch();
        Ok(())
    }

    pub fn set_confidence(&mut self, index: usize, confidence: f64) -> Result<()> {
        self.check_index(index)?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(EngineError::ResponseValue {
                index,
                value: confidence,
            });
        }
        self.state.confidence_scores[index] = confidence;
        self.state.touch();
        Ok(())
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.state.answered.contains(&index)
    }

    pub fn answered_count(&self) -> usize {
        self.state.answered.len()
    }

    /// Fraction of scenarios answered (0.0-1.0)
    pub fn progress(&self) -> f64 {
        if self.catalog.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.catalog.len() as f64
    }

    pub fn next_unanswered(&self) -> Option<usize> {
        (0..self.catalog.len()).find(|i| !self.is_answered(*i))
    }

    pub fn report(&self) -> CompletionReport {
        CompletionAnalyzer::new(self.catalog)
            .analyze(&self.state.responses, Some(&self.state.answered))
    }

    /// Whether submitting from `current_index` should backfill the remaining gaps
    pub fn should_auto_fill(&self, current_index: usize) -> bool {
        let total = self.catalog.len();
        current_index == self.catalog.last_index()
            && self.answered_count() >= total.saturating_sub(self.auto_fill_margin)
    }

    /// Backfill every gap with the sentinel and mark all scenarios answered.
    ///
    /// Returns how many slots were (re)written.
    pub fn force_complete(&mut self) -> usize {
        let result = CompletionAnalyzer::new(self.catalog)
            .auto_fill(&self.state.responses, &self.state.confidence_scores);
        info!(
            "Session {} force-completed: {} scenario(s) filled",
            self.state.session_id, result.filled_count
        );

        self.state.responses = result.responses.into_iter().map(Some).collect();
        self.state.confidence_scores = result.confidence_scores;
        self.state.answered = (0..self.catalog.len()).collect();
        self.state.touch();
        result.filled_count
    }

    /// Submit from `current_index`: auto-fills when close enough to the end,
    /// then finalizes
    pub fn submit(&mut self, current_index: usize, layout: &TraitLayout) -> Result<TraitVector> {
        if !self.report().can_complete && self.should_auto_fill(current_index) {
            debug!(
                "Auto-filling session {} at {}/{} answered",
                self.state.session_id,
                self.answered_count(),
                self.catalog.len()
            );
            self.force_complete();
        }
        self.finalize(layout)
    }

    /// Produce the trait vector once every scenario is answered
    pub fn finalize(&self, layout: &TraitLayout) -> Result<TraitVector> {
        let report = self.report();
        if !report.can_complete {
            return Err(EngineError::Incomplete {
                missing: report.unanswered_indices,
            });
        }
        let values = self
            .state
            .responses
            .iter()
            .take(self.catalog.len())
            .map(|r| r.unwrap_or(SENTINEL))
            .collect();
        TraitVector::new(values, layout.clone())
    }
}
