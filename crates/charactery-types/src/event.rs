//! Event types crossing the engine boundary.
//!
//! `ChatEvent` is what a platform adapter feeds in; `CharacterEvent` is what
//! the engine broadcasts out. All variants are Clone + Send + Sync for use
//! with tokio channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, MessageId};
use crate::profile::Profile;

/// Inbound chat activity concerning one character.
///
/// The platform adapter translates its native message, edit, delete, and
/// reaction notifications into these before delivery. Vote scores arrive
/// pre-tallied through [`crate::vote::VoteTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A new message appeared in the character's channel.
    TextSubmitted {
        source: MessageId,
        text: String,
        /// Attachment URLs, appended to the text before extraction.
        #[serde(default)]
        attachments: Vec<String>,
    },

    /// An existing message was rewritten. Vote state carries over.
    TextEdited {
        source: MessageId,
        text: String,
        #[serde(default)]
        attachments: Vec<String>,
    },

    /// A message was deleted.
    TextDeleted { source: MessageId },

    /// A message's weighted vote score changed.
    VoteChanged { source: MessageId, score: i64 },
}

impl ChatEvent {
    /// The message this event concerns.
    pub fn source(&self) -> &MessageId {
        match self {
            ChatEvent::TextSubmitted { source, .. }
            | ChatEvent::TextEdited { source, .. }
            | ChatEvent::TextDeleted { source }
            | ChatEvent::VoteChanged { source, .. } => source,
        }
    }
}

/// One historical message handed to a character at adoption time.
///
/// Unlike a live [`ChatEvent::TextSubmitted`], a backlog message carries
/// the reaction tally it had already accumulated, so replayed candidates
/// start at their real vote scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogMessage {
    pub source: MessageId,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Pre-tallied vote score at replay time.
    #[serde(default)]
    pub votes: i64,
}

/// Outbound notifications about a character's resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CharacterEvent {
    /// An identity-shaping property (name, avatar) changed. Platforms
    /// typically rename the channel or refresh the webhook persona.
    IdentityChanged {
        entity: EntityId,
        name: String,
        avatar: Option<String>,
    },

    /// Some managed property changed; carries the full resolved profile.
    StateUpdated {
        entity: EntityId,
        profile: Profile,
        at: DateTime<Utc>,
    },
}

impl CharacterEvent {
    /// The character this event concerns.
    pub fn entity(&self) -> EntityId {
        match self {
            CharacterEvent::IdentityChanged { entity, .. }
            | CharacterEvent::StateUpdated { entity, .. } => *entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_submitted_serde_roundtrip() {
        let event = ChatEvent::TextSubmitted {
            source: MessageId::from("m1"),
            text: "my name is Benny".to_string(),
            attachments: vec![],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"text_submitted\""));
        let parsed: ChatEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ChatEvent::TextSubmitted { .. }));
    }

    #[test]
    fn test_text_submitted_attachments_default_to_empty() {
        let json = r#"{"type":"text_submitted","source":"m1","text":"hello"}"#;
        let parsed: ChatEvent = serde_json::from_str(json).unwrap();
        match parsed {
            ChatEvent::TextSubmitted { attachments, .. } => assert!(attachments.is_empty()),
            other => panic!("expected TextSubmitted, got {other:?}"),
        }
    }

    #[test]
    fn test_vote_changed_serde_roundtrip() {
        let event = ChatEvent::VoteChanged {
            source: MessageId::from("m9"),
            score: -4,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"vote_changed\""));
        let parsed: ChatEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ChatEvent::VoteChanged { score: -4, .. }));
    }

    #[test]
    fn test_chat_event_source_accessor() {
        let source = MessageId::from("m3");
        let events = vec![
            ChatEvent::TextSubmitted {
                source: source.clone(),
                text: "t".to_string(),
                attachments: vec![],
            },
            ChatEvent::TextEdited {
                source: source.clone(),
                text: "t2".to_string(),
                attachments: vec![],
            },
            ChatEvent::TextDeleted {
                source: source.clone(),
            },
            ChatEvent::VoteChanged {
                source: source.clone(),
                score: 1,
            },
        ];
        for event in events {
            assert_eq!(event.source(), &source, "wrong source for {event:?}");
        }
    }

    #[test]
    fn test_identity_changed_serde_roundtrip() {
        let event = CharacterEvent::IdentityChanged {
            entity: EntityId::new(),
            name: "Benny".to_string(),
            avatar: Some("https://example.com/benny.png".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"identity_changed\""));
        let parsed: CharacterEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, CharacterEvent::IdentityChanged { .. }));
    }

    #[test]
    fn test_state_updated_serde_roundtrip() {
        let event = CharacterEvent::StateUpdated {
            entity: EntityId::new(),
            profile: Profile::named("Benny"),
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"state_updated\""));
        let parsed: CharacterEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, CharacterEvent::StateUpdated { .. }));
    }

    #[test]
    fn test_character_event_entity_accessor() {
        let entity = EntityId::new();
        let events = vec![
            CharacterEvent::IdentityChanged {
                entity,
                name: "n".to_string(),
                avatar: None,
            },
            CharacterEvent::StateUpdated {
                entity,
                profile: Profile::default(),
                at: Utc::now(),
            },
        ];
        for event in events {
            assert_eq!(event.entity(), entity, "wrong entity for {event:?}");
        }
    }

    #[test]
    fn test_backlog_message_defaults() {
        let json = r#"{"source":"m-1","text":"my name is Benny"}"#;
        let msg: BacklogMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.source.as_str(), "m-1");
        assert!(msg.attachments.is_empty());
        assert_eq!(msg.votes, 0);
    }
}
