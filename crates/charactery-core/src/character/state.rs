//! The synchronous core of one character.
//!
//! `Character` owns the profile, the candidate ledger, and the pending
//! change queue. It is CPU-bound and side-effect free: applying an event
//! mutates in-memory state and reports whether anything was queued, and
//! flushing resolves the queue through the aggregator. Timing, channels,
//! and notifications belong to the runner.

use std::sync::Arc;

use charactery_types::candidate::Candidate;
use charactery_types::event::ChatEvent;
use charactery_types::ids::{EntityId, MessageId};
use charactery_types::policy::ManagedProperty;
use charactery_types::profile::{Profile, ProfileField};
use tracing::debug;

use crate::consensus::aggregator::{FlushOutcome, apply_queue};
use crate::consensus::ledger::CandidateLedger;
use crate::route::Router;

/// One character's extraction and consensus state.
#[derive(Debug, Clone)]
pub struct Character {
    id: EntityId,
    profile: Profile,
    ledger: CandidateLedger,
    queue: Vec<Candidate>,
    router: Arc<Router>,
    properties: Arc<Vec<ManagedProperty>>,
}

impl Character {
    /// Create a character, prefilling name and avatar from the seed text.
    ///
    /// The seed is the channel-topic equivalent: routed text previously
    /// produced by `Router::say`, or empty for a brand-new character.
    /// Seeding touches only the scalar identity fields; list properties
    /// always start empty and build up from consensus.
    pub fn new(
        id: EntityId,
        router: Arc<Router>,
        properties: Arc<Vec<ManagedProperty>>,
        seed: &str,
    ) -> Self {
        let mut profile = Profile::default();
        if let Some(pairs) = router.process(seed) {
            for (key, value) in pairs {
                match key.parse::<ProfileField>() {
                    Ok(ProfileField::Name) => profile.name = value,
                    Ok(ProfileField::Avatar) => profile.avatar = Some(value),
                    _ => {}
                }
            }
        }

        Self {
            id,
            profile,
            ledger: CandidateLedger::new(),
            queue: Vec::new(),
            router,
            properties,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Number of queued changes awaiting the next flush.
    pub fn pending_changes(&self) -> usize {
        self.queue.len()
    }

    /// Apply one chat event, returning true when it queued any change.
    ///
    /// The return value is the runner's cue to (re)arm the debounce timer;
    /// events that touch nothing (unmatched text, unknown sources) must not
    /// push an armed flush further out.
    pub fn apply(&mut self, event: ChatEvent) -> bool {
        match event {
            ChatEvent::TextSubmitted {
                source,
                text,
                attachments,
            } => self.extract(source, assemble(text, &attachments), 0),

            ChatEvent::TextEdited {
                source,
                text,
                attachments,
            } => {
                // Reactions live on the platform message, which survives an
                // edit, so the prior vote score carries over.
                let prior = self.ledger.remove(&source);
                let votes = prior.as_ref().map_or(0, |c| c.votes);
                let mut queued = prior.is_some();
                if let Some(prior) = prior {
                    self.queue.push(prior);
                }
                queued |= self.extract(source, assemble(text, &attachments), votes);
                queued
            }

            ChatEvent::TextDeleted { source } => match self.ledger.remove(&source) {
                Some(candidate) => {
                    debug!(entity = %self.id, source = %candidate.source, "candidate removed");
                    self.queue.push(candidate);
                    true
                }
                None => false,
            },

            ChatEvent::VoteChanged { source, score } => {
                if !self.ledger.update_vote(&source, score) {
                    return false;
                }
                if let Some(candidate) = self.ledger.get(&source) {
                    self.queue.push(candidate.clone());
                }
                true
            }
        }
    }

    /// Replay one historical message with its reaction tally already known.
    pub fn ingest(
        &mut self,
        source: MessageId,
        text: String,
        attachments: &[String],
        votes: i64,
    ) -> bool {
        self.extract(source, assemble(text, attachments), votes)
    }

    /// Drain the pending queue and resolve it into the profile.
    pub fn flush(&mut self) -> FlushOutcome {
        if self.queue.is_empty() {
            return FlushOutcome::default();
        }
        let queue = std::mem::take(&mut self.queue);
        debug!(entity = %self.id, drained = queue.len(), "flushing queued changes");
        apply_queue(&mut self.profile, &self.ledger, &queue, &self.properties)
    }

    /// Route text, record extracted candidates, and queue them.
    fn extract(&mut self, source: MessageId, text: String, votes: i64) -> bool {
        let Some(pairs) = self.router.process(&text) else {
            return false;
        };
        let mut queued = false;
        for (key, value) in pairs {
            let candidate = Candidate::new(source.clone(), key, value, votes);
            self.ledger.record(candidate.clone());
            self.queue.push(candidate);
            queued = true;
        }
        queued
    }
}

/// Append attachment URLs to message text, space-separated.
fn assemble(text: String, attachments: &[String]) -> String {
    let mut full = text;
    for url in attachments {
        full.push(' ');
        full.push_str(url);
    }
    full
}
