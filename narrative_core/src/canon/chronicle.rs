//! Chronicle - the append-only log of story events and chapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::NodeId;

/// One recorded event or chapter summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronicleEntry {
    /// Position in the chronicle, starting at 1.
    pub sequence: u64,
    pub title: String,
    pub summary: String,
    /// Turn the entry was written after, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chronicle {
    entries: Vec<ChronicleEntry>,
}

impl Chronicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its sequence number.
    pub fn record(
        &mut self,
        title: impl Into<String>,
        summary: impl Into<String>,
        node_id: Option<NodeId>,
    ) -> u64 {
        let sequence = self.entries.last().map_or(1, |e| e.sequence + 1);
        self.entries.push(ChronicleEntry {
            sequence,
            title: title.into(),
            summary: summary.into(),
            node_id,
            recorded_at: Utc::now(),
        });
        sequence
    }

    /// The `n` most recent entries, oldest first.
    pub fn tail(&self, n: usize) -> &[ChronicleEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[ChronicleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
