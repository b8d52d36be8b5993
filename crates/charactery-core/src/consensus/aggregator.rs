//! Policy application: resolving queued candidate changes into a profile.
//!
//! A flush walks the managed property table and touches only the properties
//! whose match key appears in the drained queue. Bounded properties re-rank
//! their entire candidate pool; unbounded properties evaluate each queued
//! entry against the threshold. Every field write is equality-gated, so a
//! flush that computes what the profile already holds reports no change and
//! triggers no notifications.
//!
//! Queued entries are snapshots taken when the change was queued. At flush
//! time each one resolves against the live ledger candidate for its source
//! when that candidate still exists under the same key; otherwise the
//! snapshot stands as taken. A vote update between queueing and flushing is
//! therefore seen at its latest value, while a deleted source is judged by
//! its final state.

use charactery_types::candidate::Candidate;
use charactery_types::policy::ManagedProperty;
use charactery_types::profile::{Profile, ProfileField};
use tracing::{debug, warn};

use super::ledger::CandidateLedger;

/// What a flush changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Fields whose value changed, in property-table order.
    pub changed: Vec<ProfileField>,
    /// True when a changed property affects outward identity.
    pub identity_dirty: bool,
}

impl FlushOutcome {
    /// True when the flush changed anything at all.
    pub fn is_change(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Apply a drained queue of candidate changes to a profile.
pub fn apply_queue(
    profile: &mut Profile,
    ledger: &CandidateLedger,
    queue: &[Candidate],
    properties: &[ManagedProperty],
) -> FlushOutcome {
    let mut outcome = FlushOutcome::default();

    for property in properties {
        let match_key = property.match_key();
        let key_queue: Vec<&Candidate> =
            queue.iter().filter(|c| c.key == match_key).collect();
        if key_queue.is_empty() {
            continue;
        }

        let changed = match property.policy.quantity {
            Some(quantity) => apply_bounded(profile, ledger, property, quantity),
            None => apply_unbounded(profile, ledger, property, &key_queue),
        };

        if changed {
            debug!(field = %property.field, "property changed");
            outcome.changed.push(property.field);
            if property.policy.affects_identity {
                outcome.identity_dirty = true;
            }
        }
    }

    outcome
}

/// Re-rank the full candidate pool and keep the best `quantity` values.
///
/// With a threshold set, only candidates strictly above it are eligible.
/// The sort is stable and descending by votes, so equal scores keep ledger
/// insertion order.
fn apply_bounded(
    profile: &mut Profile,
    ledger: &CandidateLedger,
    property: &ManagedProperty,
    quantity: usize,
) -> bool {
    let mut pool = ledger.candidates_for(property.match_key());
    if let Some(threshold) = property.policy.threshold {
        pool.retain(|c| c.votes > threshold);
    }
    pool.sort_by(|a, b| b.votes.cmp(&a.votes));

    let winners: Vec<String> = pool
        .into_iter()
        .take(quantity)
        .map(|c| c.value.clone())
        .collect();

    match property.field {
        // A character keeps its last agreed name when no candidate is
        // eligible; the name field is never emptied.
        ProfileField::Name => match winners.into_iter().next() {
            Some(best) if profile.name != best => {
                profile.name = best;
                true
            }
            _ => false,
        },
        ProfileField::Avatar => {
            let next = winners.into_iter().next();
            if profile.avatar != next {
                profile.avatar = next;
                true
            } else {
                false
            }
        }
        ProfileField::Aliases => replace_list(&mut profile.aliases, winners),
        ProfileField::Responses => replace_list(&mut profile.responses, winners),
    }
}

/// Evaluate queued entries one by one against the threshold.
///
/// An eligible value absent from the list is appended; a listed value that
/// fell below is removed. The threshold comparison is asymmetric: positive
/// cutoffs demand `votes >= t`, zero and negative cutoffs drop at
/// `votes <= t`, and no cutoff never drops.
fn apply_unbounded(
    profile: &mut Profile,
    ledger: &CandidateLedger,
    property: &ManagedProperty,
    key_queue: &[&Candidate],
) -> bool {
    let list = match property.field {
        ProfileField::Aliases => &mut profile.aliases,
        ProfileField::Responses => &mut profile.responses,
        scalar => {
            warn!(field = %scalar, "unbounded policy on a scalar field; ignoring");
            return false;
        }
    };

    let mut changed = false;
    for queued in key_queue {
        let live = ledger
            .get(&queued.source)
            .filter(|candidate| candidate.key == queued.key);
        let (value, votes) = match live {
            Some(candidate) => (&candidate.value, candidate.votes),
            None => (&queued.value, queued.votes),
        };

        let below = match property.policy.threshold {
            None => false,
            Some(t) if t > 0 => votes < t,
            Some(t) => votes <= t,
        };

        let position = list.iter().position(|held| held == value);
        match (below, position) {
            (false, None) => {
                list.push(value.clone());
                changed = true;
            }
            (true, Some(index)) => {
                list.remove(index);
                changed = true;
            }
            _ => {}
        }
    }

    changed
}

fn replace_list(list: &mut Vec<String>, winners: Vec<String>) -> bool {
    if *list != winners {
        *list = winners;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charactery_types::ids::MessageId;
    use charactery_types::policy::{PropertyPolicy, default_properties};

    fn candidate(source: &str, key: &str, value: &str, votes: i64) -> Candidate {
        Candidate::new(MessageId::from(source), key, value, votes)
    }

    fn recorded(ledger: &mut CandidateLedger, c: Candidate) -> Candidate {
        ledger.record(c.clone());
        c
    }

    #[test]
    fn untouched_keys_are_left_alone() {
        let mut profile = Profile::named("Benny");
        let ledger = CandidateLedger::new();
        let outcome = apply_queue(&mut profile, &ledger, &[], &default_properties());

        assert!(!outcome.is_change());
        assert_eq!(profile.name, "Benny");
    }

    #[test]
    fn bounded_picks_highest_voted_candidate() {
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q1 = recorded(&mut ledger, candidate("m1", "name", "Benny", 5));
        let q2 = recorded(&mut ledger, candidate("m2", "name", "Captain", 7));

        let outcome = apply_queue(
            &mut profile,
            &ledger,
            &[q1, q2],
            &default_properties(),
        );

        assert_eq!(profile.name, "Captain");
        assert_eq!(outcome.changed, vec![ProfileField::Name]);
        assert!(outcome.identity_dirty);
    }

    #[test]
    fn bounded_tie_keeps_insertion_order() {
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q1 = recorded(&mut ledger, candidate("m1", "name", "First", 4));
        let q2 = recorded(&mut ledger, candidate("m2", "name", "Second", 4));

        apply_queue(&mut profile, &ledger, &[q1, q2], &default_properties());
        assert_eq!(profile.name, "First");
    }

    #[test]
    fn bounded_rescan_dethrones_stale_winner() {
        let properties = vec![ManagedProperty::new(
            ProfileField::Name,
            PropertyPolicy {
                quantity: Some(1),
                threshold: Some(3),
                affects_identity: true,
                ..PropertyPolicy::default()
            },
        )];

        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q1 = recorded(&mut ledger, candidate("m1", "name", "Benny", 5));
        let q2 = recorded(&mut ledger, candidate("m2", "name", "Captain", 7));

        apply_queue(&mut profile, &ledger, &[q1, q2], &properties);
        assert_eq!(profile.name, "Captain");

        // The former winner's score collapses below the cutoff.
        ledger.update_vote(&MessageId::from("m2"), 2);
        let vote_change = ledger.get(&MessageId::from("m2")).unwrap().clone();

        let outcome = apply_queue(&mut profile, &ledger, &[vote_change], &properties);
        assert_eq!(profile.name, "Benny");
        assert!(outcome.identity_dirty);
    }

    #[test]
    fn bounded_name_survives_empty_pool() {
        let properties = vec![ManagedProperty::new(
            ProfileField::Name,
            PropertyPolicy {
                quantity: Some(1),
                threshold: Some(3),
                affects_identity: true,
                ..PropertyPolicy::default()
            },
        )];

        let mut profile = Profile::named("Benny");
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "name", "Benny", 5));
        let snapshot = ledger.remove(&MessageId::from("m1")).unwrap();

        let outcome = apply_queue(&mut profile, &ledger, &[snapshot], &properties);
        assert!(!outcome.is_change());
        assert_eq!(profile.name, "Benny");
    }

    #[test]
    fn bounded_avatar_clears_when_pool_empties() {
        let mut profile = Profile {
            avatar: Some("http://old".to_string()),
            ..Profile::named("Benny")
        };
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "avatar", "http://old", 0));
        let snapshot = ledger.remove(&MessageId::from("m1")).unwrap();

        let outcome = apply_queue(
            &mut profile,
            &ledger,
            &[snapshot],
            &default_properties(),
        );

        assert_eq!(profile.avatar, None);
        assert_eq!(outcome.changed, vec![ProfileField::Avatar]);
        assert!(outcome.identity_dirty);
    }

    #[test]
    fn unbounded_admits_at_positive_threshold() {
        // aliases cutoff is 3: exactly 3 votes is eligible
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q = recorded(&mut ledger, candidate("m1", "alias", "Ben", 3));

        let outcome = apply_queue(&mut profile, &ledger, &[q], &default_properties());
        assert_eq!(profile.aliases, vec!["Ben"]);
        assert_eq!(outcome.changed, vec![ProfileField::Aliases]);
        assert!(!outcome.identity_dirty);
    }

    #[test]
    fn unbounded_rejects_below_positive_threshold() {
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q = recorded(&mut ledger, candidate("m1", "alias", "Ben", 2));

        let outcome = apply_queue(&mut profile, &ledger, &[q], &default_properties());
        assert!(profile.aliases.is_empty());
        assert!(!outcome.is_change());
    }

    #[test]
    fn unbounded_drops_at_nonpositive_threshold() {
        // responses cutoff is -2: exactly -2 votes is excluded
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let q = recorded(&mut ledger, candidate("m1", "response", "Hello there", 0));

        apply_queue(&mut profile, &ledger, &[q], &default_properties());
        assert_eq!(profile.responses, vec!["Hello there"]);

        ledger.update_vote(&MessageId::from("m1"), -2);
        let vote_change = ledger.get(&MessageId::from("m1")).unwrap().clone();

        let outcome = apply_queue(
            &mut profile,
            &ledger,
            &[vote_change],
            &default_properties(),
        );
        assert!(profile.responses.is_empty());
        assert_eq!(outcome.changed, vec![ProfileField::Responses]);
    }

    #[test]
    fn unbounded_keeps_value_at_negative_threshold_boundary() {
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "response", "Hello there", 0));
        apply_queue(
            &mut profile,
            &ledger,
            &[ledger.get(&MessageId::from("m1")).unwrap().clone()],
            &default_properties(),
        );

        // -1 is above the -2 cutoff; the response stays
        ledger.update_vote(&MessageId::from("m1"), -1);
        let vote_change = ledger.get(&MessageId::from("m1")).unwrap().clone();
        let outcome = apply_queue(
            &mut profile,
            &ledger,
            &[vote_change],
            &default_properties(),
        );

        assert_eq!(profile.responses, vec!["Hello there"]);
        assert!(!outcome.is_change());
    }

    #[test]
    fn queued_entry_resolves_to_live_vote() {
        // Queued at 0 votes, upvoted to 3 before the flush: the flush sees 3.
        let mut profile = Profile::default();
        let mut ledger = CandidateLedger::new();
        let stale = recorded(&mut ledger, candidate("m1", "alias", "Ben", 0));
        ledger.update_vote(&MessageId::from("m1"), 3);

        apply_queue(&mut profile, &ledger, &[stale], &default_properties());
        assert_eq!(profile.aliases, vec!["Ben"]);
    }

    #[test]
    fn deleted_source_is_judged_by_snapshot() {
        // An admitted alias whose source is deleted while still above the
        // cutoff stays listed.
        let mut profile = Profile {
            aliases: vec!["Ben".to_string()],
            ..Profile::default()
        };
        let mut ledger = CandidateLedger::new();
        ledger.record(candidate("m1", "alias", "Ben", 5));
        let snapshot = ledger.remove(&MessageId::from("m1")).unwrap();

        let outcome = apply_queue(
            &mut profile,
            &ledger,
            &[snapshot],
            &default_properties(),
        );
        assert_eq!(profile.aliases, vec!["Ben"]);
        assert!(!outcome.is_change());
    }

    #[test]
    fn flush_with_identical_values_reports_no_change() {
        let mut profile = Profile::named("Benny");
        let mut ledger = CandidateLedger::new();
        let q = recorded(&mut ledger, candidate("m1", "name", "Benny", 1));

        let outcome = apply_queue(&mut profile, &ledger, &[q], &default_properties());
        assert!(!outcome.is_change());
        assert!(!outcome.identity_dirty);
    }

    #[test]
    fn unbounded_on_scalar_field_is_ignored() {
        let properties = vec![ManagedProperty::new(
            ProfileField::Name,
            PropertyPolicy::default(),
        )];

        let mut profile = Profile::named("Benny");
        let mut ledger = CandidateLedger::new();
        let q = recorded(&mut ledger, candidate("m1", "name", "Other", 9));

        let outcome = apply_queue(&mut profile, &ledger, &[q], &properties);
        assert!(!outcome.is_change());
        assert_eq!(profile.name, "Benny");
    }
}
