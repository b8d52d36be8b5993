//! Registry of live characters.
//!
//! The roster owns one [`CharacterHandle`] per running character and the
//! shared [`EventBus`] their runners publish into. Characters enter the
//! roster by being born fresh (`birth`) or adopted from an existing seed
//! plus message history (`adopt`), and leave it through `kill`/`dismiss`.
//! Everything here is keyed by [`EntityId`], with name lookups layered on
//! top for the command surface.

use std::sync::Arc;
use std::time::Duration;

use charactery_types::error::{RosterError, TemplateError};
use charactery_types::event::{BacklogMessage, CharacterEvent, ChatEvent};
use charactery_types::ids::{EntityId, MessageId};
use charactery_types::policy::ManagedProperty;
use charactery_types::profile::Profile;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::CharacteryConfig;
use crate::event::EventBus;
use crate::route::Router;

use super::runner::{self, CharacterHandle};

/// Buffer size for the shared outbound event bus (broadcast).
const EVENT_BUFFER: usize = 1024;

/// Registry of running characters sharing one router, property table, and
/// event bus.
#[derive(Debug)]
pub struct Roster {
    router: Arc<Router>,
    properties: Arc<Vec<ManagedProperty>>,
    window: Duration,
    bus: EventBus,
    characters: DashMap<EntityId, CharacterHandle>,
}

impl Roster {
    /// Build a roster from configuration.
    ///
    /// Fails if any configured route spec does not parse.
    pub fn new(config: &CharacteryConfig) -> Result<Self, TemplateError> {
        let router = Arc::new(config.build_router()?);
        Ok(Self {
            router,
            properties: Arc::new(config.properties.clone()),
            window: config.debounce_window(),
            bus: EventBus::new(EVENT_BUFFER),
            characters: DashMap::new(),
        })
    }

    /// Create a brand-new character with the given name.
    ///
    /// The name is rendered through the router into a seed (the original
    /// announcement text), which both prefills the profile and is replayed
    /// as the character's first candidate. That makes the given name sticky:
    /// a rival name needs a better vote score to displace it.
    pub fn birth(&self, name: &str) -> Result<EntityId, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::InvalidName("name cannot be empty".to_string()));
        }
        if self.find_by_name(name).is_some() {
            return Err(RosterError::NameTaken(name.to_string()));
        }

        let id = EntityId::new();
        let seed = self.router.say(&[("name", name)]).unwrap_or_default();
        let backlog = vec![BacklogMessage {
            source: MessageId::new(format!("seed-{id}")),
            text: seed.clone(),
            attachments: Vec::new(),
            votes: 0,
        }];

        let handle = self.spawn(id, &seed, backlog);
        self.characters.insert(id, handle);
        info!(%id, name, "character born");
        Ok(id)
    }

    /// Revive a character from a previously rendered seed and its message
    /// history. Backlog messages carry their accumulated vote scores and are
    /// settled in a single pass before live events flow.
    pub fn adopt(&self, seed: &str, backlog: Vec<BacklogMessage>) -> EntityId {
        let id = EntityId::new();
        let replayed = backlog.len();
        let handle = self.spawn(id, seed, backlog);
        self.characters.insert(id, handle);
        info!(%id, replayed, "character adopted");
        id
    }

    /// Remove a character by name (case-insensitive).
    pub async fn kill(&self, name: &str) -> Result<EntityId, RosterError> {
        let id = self
            .find_by_name(name)
            .ok_or_else(|| RosterError::UnknownName(name.to_string()))?;
        self.dismiss(id).await?;
        Ok(id)
    }

    /// Remove a character by id, waiting for its task to settle and stop.
    pub async fn dismiss(&self, id: EntityId) -> Result<(), RosterError> {
        let (_, handle) = self
            .characters
            .remove(&id)
            .ok_or(RosterError::NotFound(id))?;
        handle.destroy().await;
        info!(%id, "character dismissed");
        Ok(())
    }

    /// Queue a chat event for one character.
    pub async fn deliver(&self, id: EntityId, event: ChatEvent) -> Result<(), RosterError> {
        // Clone the mailbox sender out of the map entry so no shard lock is
        // held across the send await.
        let sender = self
            .characters
            .get(&id)
            .map(|entry| entry.sender())
            .ok_or(RosterError::NotFound(id))?;
        sender
            .send(event)
            .await
            .map_err(|_| RosterError::Unavailable(id))
    }

    /// Latest settled profile for one character.
    pub fn profile(&self, id: EntityId) -> Result<Profile, RosterError> {
        self.characters
            .get(&id)
            .map(|entry| entry.profile())
            .ok_or(RosterError::NotFound(id))
    }

    /// Find a character whose settled name matches, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        let needle = name.to_lowercase();
        self.characters
            .iter()
            .find(|entry| entry.value().profile().name.to_lowercase() == needle)
            .map(|entry| *entry.key())
    }

    /// All characters mentioned in `text` by name or alias, in no
    /// particular order.
    pub fn mentioned(&self, text: &str) -> Vec<EntityId> {
        self.characters
            .iter()
            .filter(|entry| entry.value().profile().mentioned_in(text))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Pick a canned response from a character mentioned in `text`.
    ///
    /// Characters with no accumulated responses are skipped. Returns the
    /// responder and a uniformly sampled line, or `None` when nobody
    /// mentioned has anything to say.
    pub fn respond_to(&self, text: &str) -> Option<(EntityId, String)> {
        let mut rng = rand::thread_rng();
        for entry in self.characters.iter() {
            let profile = entry.value().profile();
            if !profile.mentioned_in(text) {
                continue;
            }
            if let Some(line) = profile.responses.choose(&mut rng) {
                debug!(entity = %entry.key(), "sampled canned response");
                return Some((*entry.key(), line.clone()));
            }
        }
        None
    }

    /// Subscribe to settled-state notifications from every character.
    pub fn subscribe(&self) -> broadcast::Receiver<CharacterEvent> {
        self.bus.subscribe()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Stop every character task, settling pending changes first.
    pub async fn shutdown(self) {
        let ids: Vec<EntityId> = self.characters.iter().map(|entry| *entry.key()).collect();
        let count = ids.len();
        for id in ids {
            if let Some((_, handle)) = self.characters.remove(&id) {
                handle.destroy().await;
            }
        }
        info!(count, "roster shut down");
    }

    fn spawn(&self, id: EntityId, seed: &str, backlog: Vec<BacklogMessage>) -> CharacterHandle {
        runner::spawn(
            id,
            seed,
            backlog,
            Arc::clone(&self.router),
            Arc::clone(&self.properties),
            self.window,
            self.bus.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
