//! Relevance scores for canon selection.

use std::collections::HashMap;

/// Accumulated relevance per canon entry id.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScores {
    scores: HashMap<String, f32>,
}

impl RelevanceScores {
    /// Create a new empty score table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to an entry's score (accumulates with existing score).
    pub fn add(&mut self, id: impl Into<String>, score: f32) {
        *self.scores.entry(id.into()).or_insert(0.0) += score;
    }

    /// Get the score of an entry.
    pub fn get(&self, id: &str) -> f32 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    /// Entries above `threshold`, best first. Ties break on id so the order
    /// is stable between runs.
    pub fn ranked(&self, threshold: f32) -> Vec<(&str, f32)> {
        let mut ranked: Vec<_> = self
            .scores
            .iter()
            .filter(|(_, score)| **score > threshold)
            .map(|(id, score)| (id.as_str(), *score))
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
