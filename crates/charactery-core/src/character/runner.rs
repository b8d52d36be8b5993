//! Per-character runtime task.
//!
//! Every character runs as its own tokio task owning a mutable [`Character`].
//! Chat events arrive through a bounded mpsc mailbox; each event that queues
//! a change re-arms the debounce timer, and when the timer expires the whole
//! backlog of queued changes settles in a single pass. Settled profiles are
//! published on the shared [`EventBus`] and mirrored into a `watch` channel
//! so callers can read the latest snapshot without touching the task.

use std::sync::Arc;
use std::time::Duration;

use charactery_types::error::RosterError;
use charactery_types::event::{BacklogMessage, CharacterEvent, ChatEvent};
use charactery_types::ids::EntityId;
use charactery_types::policy::ManagedProperty;
use charactery_types::profile::Profile;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consensus::Debounce;
use crate::event::EventBus;
use crate::route::Router;

use super::state::Character;

/// Buffer size for a character's chat-event mailbox (mpsc).
const MAILBOX_BUFFER: usize = 256;

// ---------------------------------------------------------------------------
// CharacterHandle
// ---------------------------------------------------------------------------

/// Handle to a running character task.
///
/// Dropping the handle closes the mailbox, which stops the task after it
/// settles any pending changes. Use [`CharacterHandle::destroy`] to stop it
/// promptly and wait for the final settle.
#[derive(Debug)]
pub struct CharacterHandle {
    id: EntityId,
    events: mpsc::Sender<ChatEvent>,
    profile: watch::Receiver<Profile>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CharacterHandle {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Latest settled profile snapshot.
    ///
    /// Reflects the state as of the most recent flush; changes still inside
    /// the debounce window are not visible yet.
    pub fn profile(&self) -> Profile {
        self.profile.borrow().clone()
    }

    /// Watch channel that tracks settled profile snapshots.
    pub fn watch(&self) -> watch::Receiver<Profile> {
        self.profile.clone()
    }

    /// Clone of the mailbox sender, for delivery paths that must not hold a
    /// borrow of the handle across an await.
    pub fn sender(&self) -> mpsc::Sender<ChatEvent> {
        self.events.clone()
    }

    /// Queue one chat event for the character.
    pub async fn deliver(&self, event: ChatEvent) -> Result<(), RosterError> {
        self.events
            .send(event)
            .await
            .map_err(|_| RosterError::Unavailable(self.id))
    }

    /// Stop the character task and wait for it to finish.
    ///
    /// Events already mailed are drained and settled before the task exits,
    /// so the last published snapshot includes them.
    pub async fn destroy(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(entity = %self.id, error = %e, "character task failed during shutdown");
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Spawn a character task and return its handle.
///
/// The `seed` prefills identity fields (see [`Character::new`]); `backlog`
/// is replayed with pre-tallied votes and settled once before the task
/// starts consuming live events.
pub fn spawn(
    id: EntityId,
    seed: &str,
    backlog: Vec<BacklogMessage>,
    router: Arc<Router>,
    properties: Arc<Vec<ManagedProperty>>,
    window: Duration,
    bus: EventBus,
) -> CharacterHandle {
    let state = Character::new(id, router, properties, seed);
    let (event_tx, event_rx) = mpsc::channel(MAILBOX_BUFFER);
    let (profile_tx, profile_rx) = watch::channel(state.profile().clone());
    let cancel = CancellationToken::new();

    let task = tokio::spawn(run(
        state,
        backlog,
        event_rx,
        profile_tx,
        bus,
        window,
        cancel.clone(),
    ));

    CharacterHandle {
        id,
        events: event_tx,
        profile: profile_rx,
        cancel,
        task,
    }
}

async fn run(
    mut state: Character,
    backlog: Vec<BacklogMessage>,
    mut events: mpsc::Receiver<ChatEvent>,
    profile: watch::Sender<Profile>,
    bus: EventBus,
    window: Duration,
    cancel: CancellationToken,
) {
    let entity = state.id();
    let mut debounce = Debounce::new(window);

    // Replay history before going live. Replay settles once at the end
    // instead of debouncing per message.
    if !backlog.is_empty() {
        let count = backlog.len();
        let mut queued = false;
        for msg in backlog {
            queued |= state.ingest(msg.source, msg.text, &msg.attachments, msg.votes);
        }
        debug!(%entity, count, "replayed backlog");
        if queued {
            settle(&mut state, &profile, &bus);
        }
    }

    info!(%entity, "character task started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // Fold in anything already mailed so the final settle
                // does not lose it.
                while let Ok(event) = events.try_recv() {
                    if state.apply(event) {
                        debounce.schedule();
                    }
                }
                debug!(%entity, "character task cancelled");
                break;
            }
            maybe = events.recv() => {
                match maybe {
                    Some(event) => {
                        if state.apply(event) {
                            debounce.schedule();
                        }
                    }
                    None => {
                        debug!(%entity, "mailbox closed");
                        break;
                    }
                }
            }
            _ = debounce.expired(), if debounce.is_pending() => {
                debounce.cancel();
                settle(&mut state, &profile, &bus);
            }
        }
    }

    if debounce.is_pending() {
        settle(&mut state, &profile, &bus);
    }
    info!(%entity, "character task stopped");
}

/// Flush the pending queue and publish the outcome.
///
/// No-op flushes publish nothing; `IdentityChanged` fires only when the
/// flush touched an identity-affecting property.
fn settle(state: &mut Character, profile: &watch::Sender<Profile>, bus: &EventBus) {
    let outcome = state.flush();
    if !outcome.is_change() {
        return;
    }

    let entity = state.id();
    let snapshot = state.profile().clone();
    let _ = profile.send(snapshot.clone());

    bus.publish(CharacterEvent::StateUpdated {
        entity,
        profile: snapshot.clone(),
        at: Utc::now(),
    });
    if outcome.identity_dirty {
        bus.publish(CharacterEvent::IdentityChanged {
            entity,
            name: snapshot.name,
            avatar: snapshot.avatar,
        });
    }

    debug!(
        %entity,
        changed = outcome.changed.len(),
        identity = outcome.identity_dirty,
        "settled pending changes"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
