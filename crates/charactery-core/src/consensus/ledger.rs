//! In-memory candidate store with two explicit indices.
//!
//! `by_source` is the primary index: at most one [`Candidate`] per source
//! message. `by_key` is a secondary index of source ids in insertion order,
//! which is what makes bounded-policy tie-breaks deterministic for a given
//! event sequence (the re-rank sort is stable).
//!
//! Invariant: while a source exists, its candidate is reachable through
//! both indices. Removal and vote updates on unknown sources are silent
//! no-ops; deletion races with the platform are routine, not errors.

use std::collections::HashMap;

use charactery_types::candidate::Candidate;
use charactery_types::ids::MessageId;

/// Candidate store backing one character.
#[derive(Debug, Clone, Default)]
pub struct CandidateLedger {
    by_source: HashMap<MessageId, Candidate>,
    by_key: HashMap<String, Vec<MessageId>>,
}

impl CandidateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the candidate for its source message.
    ///
    /// Replacing under the same key keeps the source's position in the key
    /// index; replacing under a new key moves the source to the end of the
    /// new key's index.
    pub fn record(&mut self, candidate: Candidate) {
        match self.by_source.insert(candidate.source.clone(), candidate.clone()) {
            Some(previous) if previous.key == candidate.key => {}
            Some(previous) => {
                self.unindex(&previous.key, &candidate.source);
                self.index(candidate);
            }
            None => self.index(candidate),
        }
    }

    /// Update a candidate's vote score in place.
    ///
    /// Returns `false` when the source holds no candidate.
    pub fn update_vote(&mut self, source: &MessageId, votes: i64) -> bool {
        match self.by_source.get_mut(source) {
            Some(candidate) => {
                candidate.votes = votes;
                true
            }
            None => false,
        }
    }

    /// Remove a source's candidate from both indices.
    pub fn remove(&mut self, source: &MessageId) -> Option<Candidate> {
        let candidate = self.by_source.remove(source)?;
        self.unindex(&candidate.key, source);
        Some(candidate)
    }

    /// The candidate currently held for a source, if any.
    pub fn get(&self, source: &MessageId) -> Option<&Candidate> {
        self.by_source.get(source)
    }

    /// All candidates for a key, in insertion order.
    pub fn candidates_for(&self, key: &str) -> Vec<&Candidate> {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|source| self.by_source.get(source))
            .collect()
    }

    /// Number of candidates in the ledger.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    fn index(&mut self, candidate: Candidate) {
        self.by_key
            .entry(candidate.key)
            .or_default()
            .push(candidate.source);
    }

    fn unindex(&mut self, key: &str, source: &MessageId) {
        if let Some(sources) = self.by_key.get_mut(key) {
            sources.retain(|s| s != source);
            if sources.is_empty() {
                self.by_key.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: &str, key: &str, value: &str, votes: i64) -> Candidate {
        Candidate::new(MessageId::from(source), key, value, votes)
    }

    #[test]
    fn record_and_get() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "name", "Benny", 0));

        let held = ledger.get(&MessageId::from("m1")).unwrap();
        assert_eq!(held.value, "Benny");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn candidates_for_preserves_insertion_order() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "alias", "Ben", 0));
        ledger.record(candidate("m2", "alias", "Benji", 0));
        ledger.record(candidate("m3", "name", "Benny", 0));

        let aliases: Vec<&str> = ledger
            .candidates_for("alias")
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(aliases, vec!["Ben", "Benji"]);
    }

    #[test]
    fn record_same_key_replaces_and_keeps_position() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "alias", "Ben", 2));
        ledger.record(candidate("m2", "alias", "Benji", 0));
        ledger.record(candidate("m1", "alias", "Benno", 2));

        let aliases: Vec<&str> = ledger
            .candidates_for("alias")
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(aliases, vec!["Benno", "Benji"]);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn record_new_key_moves_between_indices() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "alias", "Ben", 0));
        ledger.record(candidate("m1", "name", "Benny", 0));

        assert!(ledger.candidates_for("alias").is_empty());
        assert_eq!(ledger.candidates_for("name").len(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn remove_cleans_both_indices() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "name", "Benny", 3));

        let removed = ledger.remove(&MessageId::from("m1")).unwrap();
        assert_eq!(removed.votes, 3);
        assert!(ledger.get(&MessageId::from("m1")).is_none());
        assert!(ledger.candidates_for("name").is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_unknown_source_is_noop() {
        let mut ledger = CandidateLedger::new();
        assert!(ledger.remove(&MessageId::from("ghost")).is_none());
    }

    #[test]
    fn update_vote_in_place() {
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "alias", "Ben", 0));

        assert!(ledger.update_vote(&MessageId::from("m1"), 7));
        assert_eq!(ledger.get(&MessageId::from("m1")).unwrap().votes, 7);
        assert!(!ledger.update_vote(&MessageId::from("ghost"), 1));
    }
}
