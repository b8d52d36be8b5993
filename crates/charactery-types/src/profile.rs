use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// The resolved public state of a character.
///
/// Every field holds the current consensus outcome of the property
/// aggregator; nothing here is authored directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Display name. Once set it is never cleared: when every name candidate
    /// falls below threshold the character keeps its last agreed name.
    pub name: String,
    /// Avatar URL, when the community has settled on one.
    pub avatar: Option<String>,
    /// Alternate names the character answers to.
    pub aliases: Vec<String>,
    /// Canned replies the character may use when addressed.
    pub responses: Vec<String>,
}

impl Profile {
    /// Create a profile carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True when `text` mentions the character by name or by any alias
    /// (case-insensitive substring match). Empty names and aliases never
    /// count as mentions.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        if !self.name.is_empty() && haystack.contains(&self.name.to_lowercase()) {
            return true;
        }
        self.aliases
            .iter()
            .any(|alias| !alias.is_empty() && haystack.contains(&alias.to_lowercase()))
    }
}

/// The profile fields the aggregator can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Name,
    Avatar,
    Aliases,
    Responses,
}

impl ProfileField {
    /// The route key this field collects under when no alternate key is
    /// configured.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Avatar => "avatar",
            ProfileField::Aliases => "aliases",
            ProfileField::Responses => "responses",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(ProfileField::Name),
            "avatar" => Ok(ProfileField::Avatar),
            "aliases" => Ok(ProfileField::Aliases),
            "responses" => Ok(ProfileField::Responses),
            other => Err(format!("invalid profile field: '{other}'")),
        }
    }
}
