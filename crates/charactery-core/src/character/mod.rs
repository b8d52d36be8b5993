//! Character lifecycle: state, runtime, and roster.
//!
//! - `state` -- the synchronous core: profile, ledger, pending queue
//! - `runner` -- the per-character task driving debounced flushes
//! - `roster` -- the registry of live characters

pub mod roster;
pub mod runner;
pub mod state;

pub use roster::Roster;
pub use runner::CharacterHandle;
pub use state::Character;
