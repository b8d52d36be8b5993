//! Reversible template routing for chat text.
//!
//! - `template` -- a single spec parsed into segments, matched forward
//!   (text to fields) and backward (fields to text)
//! - `router` -- ordered route tables applying first-match-wins over
//!   delimiter-separated chunks

pub mod router;
pub mod template;

pub use router::{DEFAULT_DELIMITER, Router};
pub use template::{Segment, Template};
