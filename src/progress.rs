// File: src/progress.rs
use crate::core::dataset::VocabularyDataset;
use crate::core::types::{RelationshipKey, StarState, WordProgress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owns every piece of learning progress: per-word records and per-edge
/// brightness. Records are created lazily; a missing one reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStore {
    pub(crate) star_progress: BTreeMap<String, WordProgress>,
    pub(crate) connection_brightness: BTreeMap<RelationshipKey, f64>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_mark(&mut self, word: &str) {
        let record = self.star_progress.entry(word.to_string()).or_default();
        record.marked = !record.marked;
        tracing::debug!(word, marked = record.marked, "toggled mark");
    }

    /// Every call is one real attempt.
    pub fn record_attempt(&mut self, word: &str, is_correct: bool) {
        let record = self.star_progress.entry(word.to_string()).or_default();
        record.attempts = record.attempts.saturating_add(1);
        if is_correct {
            record.correct = record.correct.saturating_add(1);
        }
    }

    /// Adds `delta` to the edge between `a` and `b`, clamped to `[0, 1]`.
    pub fn increment_brightness(&mut self, a: &str, b: &str, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let value = self.connection_brightness.entry(RelationshipKey::new(a, b)).or_insert(0.0);
        *value = (*value + delta).clamp(0.0, 1.0);
    }

    pub fn connection_brightness(&self, a: &str, b: &str) -> f64 {
        self.connection_brightness
            .get(&RelationshipKey::new(a, b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of the brightness of every edge touching `word`, saturating at 1.
    pub fn star_brightness(&self, dataset: &VocabularyDataset, word: &str) -> f64 {
        let total: f64 = dataset
            .neighbours(word)
            .into_iter()
            .map(|other| self.connection_brightness(word, other))
            .sum();
        total.clamp(0.0, 1.0)
    }

    pub fn progress(&self, word: &str) -> WordProgress {
        self.star_progress.get(word).copied().unwrap_or_default()
    }

    /// Brightness is computed on every call, never cached.
    pub fn state(&self, dataset: &VocabularyDataset, word: &str) -> StarState {
        let progress = self.progress(word);
        StarState {
            brightness: self.star_brightness(dataset, word),
            marked: progress.marked,
            attempts: progress.attempts,
            correct: progress.correct,
        }
    }

    /// Words flagged for review, sorted.
    pub fn marked_words(&self) -> Vec<&str> {
        self.star_progress
            .iter()
            .filter(|(_, p)| p.marked)
            .map(|(word, _)| word.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.star_progress.is_empty() && self.connection_brightness.is_empty()
    }

    pub fn clear(&mut self) {
        self.star_progress.clear();
        self.connection_brightness.clear();
    }
}
