use std::collections::VecDeque;

use crate::model::PlantIdentification;

/// Maximum number of identifications kept for the session.
pub const HISTORY_CAPACITY: usize = 10;

/// Bounded, most-recent-first list of identifications.
///
/// Owned by whichever view layer runs the session; nothing here is global
/// and nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: VecDeque<PlantIdentification>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, evicting the oldest entries beyond capacity.
    pub fn record(&mut self, entry: PlantIdentification) {
        tracing::debug!(id = %entry.id, name = %entry.common_name, "recording identification");
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Owned copy, newest first.
    pub fn snapshot(&self) -> Vec<PlantIdentification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&PlantIdentification> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&PlantIdentification> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantIdentification> {
        self.entries.iter()
    }
}
