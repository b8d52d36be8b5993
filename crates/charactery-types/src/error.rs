use thiserror::Error;

use crate::ids::EntityId;

/// Errors raised while parsing a template spec.
///
/// All of these surface at registration or config-load time; a spec that
/// parses cleanly never fails at match time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template spec is empty")]
    EmptySpec,

    #[error("unbalanced optional group in '{0}'")]
    UnbalancedOptional(String),

    #[error("nested optional group in '{0}'")]
    NestedOptional(String),

    #[error("capture with no name in '{0}'")]
    EmptyCapture(String),

    #[error("duplicate capture '{name}' in '{spec}'")]
    DuplicateCapture { spec: String, name: String },

    #[error("trailing escape in '{0}'")]
    TrailingEscape(String),
}

/// Errors from character roster operations.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid character name: {0}")]
    InvalidName(String),

    #[error("character name '{0}' is already taken")]
    NameTaken(String),

    #[error("no character is named '{0}'")]
    UnknownName(String),

    #[error("character {0} is not on the roster")]
    NotFound(EntityId),

    #[error("character {0} is shutting down")]
    Unavailable(EntityId),
}
