//! Restoration — put original values back into placeholder-bearing text.

use std::collections::HashSet;

use regex::Captures;
use serde::Serialize;
use tracing::debug;

use crate::placeholder::{PlaceholderMap, TOKEN_RE};

/// Result of restoring a text, with bookkeeping about the placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restoration {
    pub text: String,
    /// Placeholder occurrences that were substituted.
    pub restored: usize,
    /// Map placeholders that never appeared in the input.
    pub missing: Vec<String>,
}

/// Substitute every placeholder from `map` found in `text` with its original.
///
/// See [`restore_report`].
pub fn restore(text: &str, map: &PlaceholderMap) -> String {
    restore_report(text, map).text
}

/// Restore `text` and report which placeholders were found.
///
/// The input usually comes back from an external summarizer, so it is
/// scanned tolerantly: missing placeholders are skipped, repeated ones are
/// all restored, and tokens the summarizer altered (case, punctuation) or
/// that are not in the map are left untouched. The scan is a single pass,
/// so restored values are never re-scanned and the result does not depend
/// on map order.
pub fn restore_report(text: &str, map: &PlaceholderMap) -> Restoration {
    if map.is_empty() {
        return Restoration {
            text: text.to_string(),
            restored: 0,
            missing: Vec::new(),
        };
    }

    let mut restored = 0usize;
    let mut seen: HashSet<String> = HashSet::new();

    let out = TOKEN_RE
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            match map.get_original(token) {
                Some(original) => {
                    restored += 1;
                    seen.insert(token.to_string());
                    original.to_string()
                }
                None => token.to_string(),
            }
        })
        .into_owned();

    let missing: Vec<String> = map
        .entries()
        .iter()
        .filter(|e| !seen.contains(&e.placeholder))
        .map(|e| e.placeholder.clone())
        .collect();

    debug!(
        "Restored {} placeholder occurrences ({} of {} placeholders missing)",
        restored,
        missing.len(),
        map.len()
    );

    Restoration {
        text: out,
        restored,
        missing,
    }
}
