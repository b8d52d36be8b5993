//! Outbound event distribution.
//!
//! Provides an `EventBus` that distributes `CharacterEvent` notifications to
//! all subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
