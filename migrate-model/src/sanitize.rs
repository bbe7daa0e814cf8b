//! Filesystem-safe name sanitization.
//!
//! Collection paths and card/dashboard file names are derived from
//! user-authored names that may contain arbitrary Unicode, path
//! separators, or characters illegal on some filesystems. The sanitizer
//! is ASCII-safe, length-bounded, and case-preserving (spec §6).

use regex_lite::Regex;
use std::sync::OnceLock;

/// Maximum length, in bytes, of a sanitized slug.
const MAX_SLUG_LEN: usize = 80;

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._ -]").unwrap())
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ _]+").unwrap())
}

/// Sanitize a single name component into an ASCII-safe, length-bounded
/// slug, preserving case. Non-ASCII and filesystem-hostile characters
/// are replaced with `_`; runs of whitespace/underscore collapse to a
/// single `_`.
pub fn sanitize_slug(name: &str) -> String {
    let replaced = disallowed().replace_all(name, "_");
    let collapsed = whitespace_run().replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches(|c: char| c == '_' || c == '.' || c == ' ');

    let truncated: String = trimmed.chars().take(MAX_SLUG_LEN).collect();

    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

/// Build a `/`-joined collection path from a chain of ancestor names,
/// each individually sanitized.
pub fn collection_path(chain: &[&str]) -> String {
    chain
        .iter()
        .map(|name| sanitize_slug(name))
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the on-disk file name for a card: `card_<id>_<slug>.json`.
pub fn card_file_name(id: i64, name: &str) -> String {
    format!("card_{}_{}.json", id, sanitize_slug(name))
}

/// Build the on-disk file name for a dashboard:
/// `dash_<id>_<slug>.json`.
pub fn dashboard_file_name(id: i64, name: &str) -> String {
    format!("dash_{}_{}.json", id, sanitize_slug(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_slug("Sales/Q1"), "Sales_Q1");
    }

    #[test]
    fn sanitize_preserves_case() {
        assert_eq!(sanitize_slug("Weekly KPIs"), "Weekly_KPIs");
    }

    #[test]
    fn sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_slug("Too   Many   Spaces"), "Too_Many_Spaces");
    }

    #[test]
    fn sanitize_truncates_long_names() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_slug(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn sanitize_empty_falls_back_to_untitled() {
        assert_eq!(sanitize_slug("///"), "untitled");
    }

    #[test]
    fn collection_path_joins_with_slash() {
        assert_eq!(collection_path(&["Analytics", "Sales"]), "Analytics/Sales");
    }

    #[test]
    fn card_file_name_is_stable() {
        assert_eq!(
            card_file_name(42, "Monthly Revenue"),
            "card_42_Monthly_Revenue.json"
        );
    }
}
