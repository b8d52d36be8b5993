//! Observability plumbing for charactery services.
//!
//! Keeps subscriber wiring out of the engine crates: `charactery-core` only
//! emits `tracing` events, and binaries embedding the engine call into this
//! crate once at startup.

pub mod tracing_setup;

pub use tracing_setup::init_tracing;
