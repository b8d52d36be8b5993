use serde::{Deserialize, Serialize};

/// Emoji-to-weight table for community approval signals.
///
/// Lives at the platform boundary: adapters run a message's reaction tally
/// through this table and hand the engine a single signed score. The engine
/// itself never sees emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTable {
    /// Emoji counting +1 per reaction.
    pub up: Vec<String>,
    /// Emoji counting -1 per reaction.
    pub down: Vec<String>,
}

impl Default for VoteTable {
    fn default() -> Self {
        Self {
            up: ["🔼", "☝️", "👆", "🆙", "⬆", "👍", "⏫", "⬆️", "✔️", "☑️", "✅"]
                .into_iter()
                .map(String::from)
                .collect(),
            down: ["👇", "👎", "⬇", "🔽", "🔻", "⏬", "⬇️", "❌"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl VoteTable {
    /// Signed weight of a single emoji: +1, -1, or 0 when unlisted.
    pub fn weight(&self, emoji: &str) -> i64 {
        if self.up.iter().any(|e| e == emoji) {
            1
        } else if self.down.iter().any(|e| e == emoji) {
            -1
        } else {
            0
        }
    }

    /// True when the emoji carries any vote weight.
    pub fn is_vote(&self, emoji: &str) -> bool {
        self.weight(emoji) != 0
    }

    /// Weighted score of a full reaction tally of `(emoji, count)` pairs.
    pub fn tally<'a, I>(&self, reactions: I) -> i64
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        reactions
            .into_iter()
            .map(|(emoji, count)| self.weight(emoji) * count as i64)
            .sum()
    }
}
