//! Vote-weighted consensus over extracted candidates.
//!
//! - `ledger` -- the in-memory candidate store, indexed by source message
//!   and by route key
//! - `debounce` -- the two-state timer coalescing bursts of changes into
//!   one flush
//! - `aggregator` -- policy application: bounded re-ranking and unbounded
//!   threshold membership

pub mod aggregator;
pub mod debounce;
pub mod ledger;

pub use aggregator::{FlushOutcome, apply_queue};
pub use debounce::Debounce;
pub use ledger::CandidateLedger;
