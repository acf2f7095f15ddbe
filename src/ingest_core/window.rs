//! Deduplication window between two flushes
//!
//! Holds at most one entry per infohash: the payload of its latest
//! observation plus how many times it was observed since the last drain.

use super::record::Observation;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedObservation {
    pub observation: Observation,
    pub occurrences: u64,
}

#[derive(Debug, Default)]
pub struct AggregationWindow {
    entries: HashMap<String, AggregatedObservation>,
}

impl AggregationWindow {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Count one observation and keep it as the current payload. Returns the
    /// updated occurrence count for its infohash.
    pub fn record(&mut self, observation: Observation) -> u64 {
        match self.entries.get_mut(&observation.infohash) {
            Some(entry) => {
                entry.occurrences += 1;
                entry.observation = observation;
                entry.occurrences
            }
            None => {
                self.entries.insert(
                    observation.infohash.clone(),
                    AggregatedObservation {
                        observation,
                        occurrences: 1,
                    },
                );
                1
            }
        }
    }

    /// Take every entry out, leaving the window empty. Order is unspecified.
    pub fn drain(&mut self) -> Vec<AggregatedObservation> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn occurrences(&self, infohash: &str) -> Option<u64> {
        self.entries.get(infohash).map(|entry| entry.occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(infohash: &str, name: &str, length: i64) -> Observation {
        Observation::single_file(infohash, name, length)
    }

    #[test]
    fn test_dedup_keeps_last_payload_and_count() {
        let mut window = AggregationWindow::new();
        for i in 0..5 {
            window.record(obs("x", &format!("name_{}", i), i));
        }
        window.record(obs("y", "other", 1));

        assert_eq!(window.len(), 2);
        assert_eq!(window.occurrences("x"), Some(5));

        let mut drained = window.drain();
        drained.sort_by(|a, b| a.observation.infohash.cmp(&b.observation.infohash));
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].occurrences, 5);
        assert_eq!(drained[0].observation, obs("x", "name_4", 4));
        assert_eq!(drained[1].occurrences, 1);
    }

    #[test]
    fn test_drain_resets_counts() {
        let mut window = AggregationWindow::new();
        assert_eq!(window.record(obs("x", "a", 1)), 1);
        assert_eq!(window.record(obs("x", "a", 1)), 2);

        assert_eq!(window.drain().len(), 1);
        assert!(window.is_empty());
        assert_eq!(window.occurrences("x"), None);

        assert_eq!(window.record(obs("x", "a", 1)), 1);
    }

    #[test]
    fn test_drain_empty_window() {
        let mut window = AggregationWindow::new();
        assert!(window.drain().is_empty());
        assert!(window.is_empty());
    }
}
