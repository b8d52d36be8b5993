use serde::{Deserialize, Serialize};

use crate::profile::ProfileField;

/// Consensus policy for one managed property.
///
/// Setting `quantity` selects bounded mode: the field holds the best 1..n
/// candidates by vote, re-ranked over the whole pool at every flush. Leaving
/// it unset selects unbounded mode: membership is decided per queued change
/// against the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyPolicy {
    /// Bounded mode: how many winners the field holds (1 = scalar field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<usize>,
    /// Route key to collect under when it differs from the field name
    /// (aliases collect under "alias", responses under "response").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_key: Option<String>,
    /// Vote cutoff. Positive cutoffs demand `votes >= t` to count; zero or
    /// negative cutoffs drop a value once `votes <= t`. Unset means votes
    /// never disqualify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    /// Whether a change to this property alters the character's outward
    /// identity (name, look) and should raise an identity notification.
    #[serde(default)]
    pub affects_identity: bool,
}

/// A profile field under aggregator management, paired with its policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedProperty {
    pub field: ProfileField,
    pub policy: PropertyPolicy,
}

impl ManagedProperty {
    pub fn new(field: ProfileField, policy: PropertyPolicy) -> Self {
        Self { field, policy }
    }

    /// The route key this property collects candidates under.
    pub fn match_key(&self) -> &str {
        self.policy.alt_key.as_deref().unwrap_or(self.field.key())
    }
}

/// The stock management table: name and avatar are single identity-shaping
/// winners, aliases admit at 3 votes, responses only drop at -2.
pub fn default_properties() -> Vec<ManagedProperty> {
    vec![
        ManagedProperty::new(
            ProfileField::Name,
            PropertyPolicy {
                quantity: Some(1),
                affects_identity: true,
                ..PropertyPolicy::default()
            },
        ),
        ManagedProperty::new(
            ProfileField::Aliases,
            PropertyPolicy {
                alt_key: Some("alias".to_string()),
                threshold: Some(3),
                ..PropertyPolicy::default()
            },
        ),
        ManagedProperty::new(
            ProfileField::Avatar,
            PropertyPolicy {
                quantity: Some(1),
                affects_identity: true,
                ..PropertyPolicy::default()
            },
        ),
        ManagedProperty::new(
            ProfileField::Responses,
            PropertyPolicy {
                alt_key: Some("response".to_string()),
                threshold: Some(-2),
                ..PropertyPolicy::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_key_prefers_alt_key() {
        let prop = ManagedProperty::new(
            ProfileField::Aliases,
            PropertyPolicy {
                alt_key: Some("alias".to_string()),
                ..PropertyPolicy::default()
            },
        );
        assert_eq!(prop.match_key(), "alias");
    }

    #[test]
    fn test_match_key_falls_back_to_field_key() {
        let prop = ManagedProperty::new(ProfileField::Name, PropertyPolicy::default());
        assert_eq!(prop.match_key(), "name");
    }

    #[test]
    fn test_default_properties_table() {
        let props = default_properties();
        assert_eq!(props.len(), 4);

        let name = &props[0];
        assert_eq!(name.field, ProfileField::Name);
        assert_eq!(name.policy.quantity, Some(1));
        assert!(name.policy.affects_identity);

        let aliases = &props[1];
        assert_eq!(aliases.match_key(), "alias");
        assert_eq!(aliases.policy.threshold, Some(3));
        assert!(!aliases.policy.affects_identity);

        let responses = &props[3];
        assert_eq!(responses.match_key(), "response");
        assert_eq!(responses.policy.threshold, Some(-2));
    }
}
