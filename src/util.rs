/// Utility helpers shared by the collector and the renderer.
///
/// This module contains:
/// - Time helpers
/// - Slug generation for profile file names
///
/// IMPORTANT:
/// - No chain-specific business logic should live here.
/// - This module must remain lightweight and deterministic.
///
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
///
/// Used for:
/// - The Collection run timestamp
/// - Per-record `last_update` values
///
/// PANIC:
/// - Panics if system time is before UNIX_EPOCH (should never happen).
///
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time is before UNIX_EPOCH")
        .as_secs() as i64
}

/// Slugify a label for use in a profile file name.
///
/// Target format: lowercase, runs of non-alphanumeric characters
/// collapsed to a single `-`, no leading or trailing `-`.
///
/// Examples:
/// - "Subnet 42"       -> "subnet-42"
/// - "Text  Prompting" -> "text-prompting"
///
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_dash = false;

    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_separator_runs() {
        assert_eq!(slug("Subnet 42"), "subnet-42");
        assert_eq!(slug("Text  Prompting"), "text-prompting");
        assert_eq!(slug("--Edge--Case--"), "edge-case");
    }

    #[test]
    fn slug_of_empty_is_empty() {
        assert_eq!(slug(""), "");
        assert_eq!(slug("!!!"), "");
    }

    #[test]
    fn now_secs_is_recent() {
        // Anything after 2024-01-01 counts as sane.
        assert!(now_secs() > 1_704_067_200);
    }
}
