use std::sync::Arc;

use heapscope_types::{Graph, HistoryItem, HistoryLabel};

use crate::HistoryError;

/// One remembered snapshot. Immutable once stored.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub label: HistoryLabel,
    pub graph: Arc<Graph>,
}

/// Append-only log of labeled snapshots.
///
/// Indices are assigned from 0 in insertion order and never change. Lookups
/// accept negative indices counting back from the newest entry (`-1`).
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: HistoryLabel, graph: Graph) -> usize {
        let index = self.entries.len();
        self.entries.push(HistoryEntry {
            label,
            graph: Arc::new(graph),
        });
        index
    }

    /// Turns an absolute or relative index into an absolute one.
    pub fn resolve(&self, index: i64) -> Result<usize, HistoryError> {
        let len = self.entries.len();
        let out_of_range = HistoryError::IndexOutOfRange { index, len };
        let signed_len = i64::try_from(len).map_err(|_| out_of_range.clone())?;
        let absolute = if index < 0 { signed_len + index } else { index };
        if (0..signed_len).contains(&absolute) {
            usize::try_from(absolute).map_err(|_| out_of_range)
        } else {
            Err(out_of_range)
        }
    }

    pub fn at(&self, index: i64) -> Result<&HistoryEntry, HistoryError> {
        let absolute = self.resolve(index)?;
        Ok(&self.entries[absolute])
    }

    /// Entries with their absolute index, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HistoryEntry)> {
        self.entries.iter().enumerate().rev()
    }

    /// Rendered listing, most recent first.
    pub fn listing(&self) -> Vec<HistoryItem> {
        self.iter()
            .map(|(index, entry)| HistoryItem {
                index,
                label: entry.label.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(line: u32) -> HistoryLabel {
        HistoryLabel::new("list.cpp", line, 5, "reverse")
    }

    fn filled(n: u32) -> History {
        let mut history = History::new();
        for line in 0..n {
            history.add(label(line), Graph::new());
        }
        history
    }

    #[test]
    fn indices_start_at_zero_and_grow() {
        let mut history = History::new();
        assert_eq!(history.add(label(1), Graph::new()), 0);
        assert_eq!(history.add(label(2), Graph::new()), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let history = filled(3);
        assert_eq!(history.resolve(-1), Ok(2));
        assert_eq!(history.resolve(-3), Ok(0));
        assert_eq!(history.at(-1).map(|entry| entry.label.line), Ok(2));
        assert_eq!(history.at(0).map(|entry| entry.label.line), Ok(0));
    }

    #[test]
    fn out_of_range_lookups_fail() {
        let history = filled(2);
        for index in [2, 7, -3, i64::MIN] {
            assert_eq!(
                history.resolve(index),
                Err(HistoryError::IndexOutOfRange { index, len: 2 }),
                "index {index}"
            );
        }
        assert!(History::new().at(-1).is_err());
        assert!(History::new().at(0).is_err());
    }

    #[test]
    fn listing_is_most_recent_first() {
        let history = filled(3);
        let indices: Vec<usize> = history.listing().iter().map(|item| item.index).collect();
        assert_eq!(indices, [2, 1, 0]);
        assert_eq!(history.listing()[0].label, label(2));
    }
}
