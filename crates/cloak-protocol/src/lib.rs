//! Reversible anonymization protocol — placeholder mapping, redaction, restoration.
//!
//! Detected spans are deduplicated by literal value into a `PlaceholderMap`
//! of `<LABEL_N>` tokens. `redact` substitutes longest values first so no
//! shorter value can split a longer one, and `restore` scans the (possibly
//! rewritten) text once, putting every recognized token back.

pub mod placeholder;
pub mod redact;
pub mod restore;

pub use placeholder::{is_placeholder_token, MapEntry, PlaceholderMap};
pub use redact::{find_residuals, redact, redact_spans};
pub use restore::{restore, restore_report, Restoration};
