//! Runtime pipeline — coordinates one anonymize → summarize → restore cycle.
//!
//! Detection, mapping and redaction are pure; the summarizer call is the
//! only suspending step and runs under a timeout with bounded retries that
//! reuse the same placeholder map.

pub mod pipeline;
pub mod types;

pub use pipeline::{anonymize, Pipeline};
pub use types::*;
