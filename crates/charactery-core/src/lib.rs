//! Core engine for Charactery: template routing, vote-weighted consensus,
//! and the per-character runtime.
//!
//! The pipeline: a platform adapter feeds `ChatEvent`s to a character, the
//! pattern router extracts candidate attribute values, the candidate ledger
//! tracks them alongside their vote scores, and the debounced aggregator
//! resolves them into the character's `Profile`, announcing the outcome on
//! the event bus. The only workspace dependency is `charactery-types`;
//! platform I/O lives with the adapters.

pub mod character;
pub mod config;
pub mod consensus;
pub mod event;
pub mod route;
