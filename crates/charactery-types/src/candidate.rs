use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

/// One extracted attribute value, tied to the message it came from.
///
/// A source message holds at most one candidate at a time: re-extraction
/// after an edit replaces it, deletion removes it. `votes` is the platform's
/// weighted reaction score for the source message and changes in place as
/// reactions come and go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Message the value was extracted from.
    pub source: MessageId,
    /// Route key the value was extracted under ("name", "alias", ...).
    pub key: String,
    /// Extracted value, original casing preserved.
    pub value: String,
    /// Current weighted vote score of the source message.
    pub votes: i64,
}

impl Candidate {
    pub fn new(
        source: MessageId,
        key: impl Into<String>,
        value: impl Into<String>,
        votes: i64,
    ) -> Self {
        Self {
            source,
            key: key.into(),
            value: value.into(),
            votes,
        }
    }
}
