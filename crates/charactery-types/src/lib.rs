//! Shared domain types for Charactery.
//!
//! This crate contains the core domain types used across the Charactery
//! engine: candidates, profiles, property policies, vote tables, and the
//! chat/character event types, plus their associated errors.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod candidate;
pub mod error;
pub mod event;
pub mod ids;
pub mod policy;
pub mod profile;
pub mod vote;
