//! Inline metadata filter grammar.
//!
//! Queries may start with a contiguous run of bracket directives, for example
//! `[type:pdf] [carpeta:seguridad] [fecha>=2024-01-01] resume mis politicas`.
//! The run is strictly anchored to the start of the text: parsing consumes
//! complete `[tag]` groups separated only by whitespace and stops at the first
//! character that does not continue the run. Everything after that point is the
//! clean question. Unrecognized directives and malformed dates are dropped
//! without aborting the parse.

use crate::index::FragmentMetadata;
use std::collections::BTreeSet;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Structured predicate extracted from inline query directives.
///
/// All fields default to empty/absent; an empty filter set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Normalized, dot-prefixed lowercase extensions (`[type:pdf]` → `.pdf`).
    pub extensions: BTreeSet<String>,
    /// Lowercase folder substrings (`[carpeta:seguridad]`).
    pub folders: BTreeSet<String>,
    /// Inclusive lower date bound (`[fecha>=YYYY-MM-DD]`).
    pub date_from: Option<Date>,
    /// Inclusive upper date bound (`[fecha<=YYYY-MM-DD]`).
    pub date_to: Option<Date>,
}

impl FilterSet {
    /// Whether no directive constrains this set.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
            && self.folders.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Evaluate the set against a fragment's metadata.
    ///
    /// Extensions require membership; folders match as substrings of either the
    /// folder or the source path; date bounds are inclusive and fail open when
    /// the fragment carries no parseable date.
    pub fn matches(&self, metadata: &FragmentMetadata) -> bool {
        if !self.extensions.is_empty() {
            let ext = metadata.ext.to_lowercase();
            if !self.extensions.contains(&ext) {
                return false;
            }
        }

        if !self.folders.is_empty() {
            let folder = metadata.folder.to_lowercase();
            let source = metadata.source.to_lowercase();
            let folder_ok = self
                .folders
                .iter()
                .any(|needle| folder.contains(needle) || source.contains(needle));
            if !folder_ok {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let parsed = metadata.date.as_deref().and_then(parse_date);
            if let Some(date) = parsed {
                if let Some(from) = self.date_from
                    && date < from
                {
                    return false;
                }
                if let Some(to) = self.date_to
                    && date > to
                {
                    return false;
                }
            }
        }

        true
    }
}

/// Extract the leading directive run from raw query text.
///
/// Returns the filter set plus the remaining clean question, trimmed of
/// surrounding whitespace. When no directive run is anchored at the start the
/// filter set is empty and the text comes back unchanged (after trimming).
pub fn parse_filters(raw: &str) -> (FilterSet, String) {
    let mut filters = FilterSet::default();
    let mut rest = raw;

    loop {
        let trimmed = rest.trim_start();
        let Some(after_open) = trimmed.strip_prefix('[') else {
            break;
        };
        let Some(close) = after_open.find(']') else {
            break;
        };
        let inner = &after_open[..close];
        if inner.is_empty() || inner.contains('[') {
            break;
        }
        apply_directive(inner, &mut filters);
        rest = &after_open[close + 1..];
    }

    (filters, rest.trim().to_string())
}

fn apply_directive(inner: &str, filters: &mut FilterSet) {
    let tag = inner.trim().to_lowercase();

    if let Some(value) = tag.strip_prefix("type:") {
        let ext = value.trim();
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{ext}")
        };
        filters.extensions.insert(ext);
    } else if let Some(value) = tag.strip_prefix("carpeta:") {
        let folder = value.trim();
        if !folder.is_empty() {
            filters.folders.insert(folder.to_string());
        }
    } else if let Some(value) = tag.strip_prefix("fecha>=") {
        // Malformed dates are dropped on purpose; the rest of the run still applies.
        if let Some(date) = parse_date(value.trim()) {
            filters.date_from = Some(date);
        }
    } else if let Some(value) = tag.strip_prefix("fecha<=") {
        if let Some(date) = parse_date(value.trim()) {
            filters.date_to = Some(date);
        }
    } else {
        tracing::trace!(directive = %tag, "Ignoring unrecognized filter directive");
    }
}

/// Parse a `YYYY-MM-DD` calendar date, returning `None` on any format error.
pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn empty_set_matches_everything() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert!(filters.matches(&FragmentMetadata::default()));
    }

    #[test]
    fn parses_full_directive_run() {
        let (filters, question) = parse_filters(
            "[type:pdf] [carpeta:Seguridad] [fecha>=2024-01-01] [fecha<=2024-12-31] resume mis politicas",
        );
        assert_eq!(
            filters.extensions.iter().collect::<Vec<_>>(),
            vec![&".pdf".to_string()]
        );
        assert_eq!(
            filters.folders.iter().collect::<Vec<_>>(),
            vec![&"seguridad".to_string()]
        );
        assert_eq!(filters.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(filters.date_to, Some(date!(2024 - 12 - 31)));
        assert_eq!(question, "resume mis politicas");
    }

    #[test]
    fn normalizes_extension_case_and_dot() {
        let (filters, question) = parse_filters("[type:PDF] x");
        assert!(filters.extensions.contains(".pdf"));
        assert_eq!(question, "x");

        let (filters, _) = parse_filters("[TYPE:.DocX] y");
        assert!(filters.extensions.contains(".docx"));
    }

    #[test]
    fn adjacent_groups_without_whitespace_parse() {
        let (filters, question) = parse_filters("[type:pdf][fecha>=2024-01-01] resume mis politicas");
        assert!(filters.extensions.contains(".pdf"));
        assert_eq!(filters.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(question, "resume mis politicas");
    }

    #[test]
    fn malformed_date_is_dropped_but_run_continues() {
        let (filters, question) = parse_filters("[fecha>=not-a-date] [type:md] hola");
        assert_eq!(filters.date_from, None);
        assert!(filters.extensions.contains(".md"));
        assert_eq!(question, "hola");
    }

    #[test]
    fn unrecognized_directive_is_ignored() {
        let (filters, question) = parse_filters("[banana:split] [type:txt] hola");
        assert_eq!(filters.extensions.len(), 1);
        assert!(filters.folders.is_empty());
        assert_eq!(question, "hola");
    }

    #[test]
    fn empty_carpeta_is_skipped() {
        let (filters, _) = parse_filters("[carpeta: ] hola");
        assert!(filters.folders.is_empty());
    }

    #[test]
    fn repeated_date_directive_last_wins() {
        let (filters, _) = parse_filters("[fecha>=2024-01-01][fecha>=2024-06-01] hola");
        assert_eq!(filters.date_from, Some(date!(2024 - 06 - 01)));
    }

    #[test]
    fn text_without_run_is_returned_trimmed() {
        let (filters, question) = parse_filters("  resume mis politicas  ");
        assert!(filters.is_empty());
        assert_eq!(question, "resume mis politicas");
    }

    #[test]
    fn brackets_mid_text_are_not_directives() {
        let (filters, question) = parse_filters("resume [type:pdf] mis politicas");
        assert!(filters.is_empty());
        assert_eq!(question, "resume [type:pdf] mis politicas");
    }

    #[test]
    fn unterminated_bracket_stops_the_run() {
        let (filters, question) = parse_filters("[type:pdf] [carpeta:seg hola");
        assert!(filters.extensions.contains(".pdf"));
        assert!(filters.folders.is_empty());
        assert_eq!(question, "[carpeta:seg hola");
    }

    #[test]
    fn parse_is_idempotent() {
        let (first, clean) = parse_filters("[type:pdf][fecha>=2024-01-01] resume mis politicas");
        assert!(!first.is_empty());
        let (second, again) = parse_filters(&clean);
        assert!(second.is_empty());
        assert_eq!(again, clean);
    }

    #[test]
    fn matches_extension_membership() {
        let (filters, _) = parse_filters("[type:pdf] q");
        let pdf = FragmentMetadata {
            ext: ".pdf".into(),
            ..Default::default()
        };
        let docx = FragmentMetadata {
            ext: ".docx".into(),
            ..Default::default()
        };
        assert!(filters.matches(&pdf));
        assert!(!filters.matches(&docx));
    }

    #[test]
    fn folder_matches_via_folder_or_source() {
        let (filters, _) = parse_filters("[carpeta:seguridad] q");
        let by_folder = FragmentMetadata {
            folder: "notas/seguridad".into(),
            ..Default::default()
        };
        let by_source = FragmentMetadata {
            source: "docs/Seguridad/politicas.pdf".into(),
            ..Default::default()
        };
        let neither = FragmentMetadata {
            folder: "finanzas".into(),
            source: "docs/finanzas/q1.xlsx".into(),
            ..Default::default()
        };
        assert!(filters.matches(&by_folder));
        assert!(filters.matches(&by_source));
        assert!(!filters.matches(&neither));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let (filters, _) = parse_filters("[fecha>=2024-01-01][fecha<=2024-12-31] q");
        let on_lower = FragmentMetadata {
            date: Some("2024-01-01".into()),
            ..Default::default()
        };
        let on_upper = FragmentMetadata {
            date: Some("2024-12-31".into()),
            ..Default::default()
        };
        let before = FragmentMetadata {
            date: Some("2023-12-31".into()),
            ..Default::default()
        };
        assert!(filters.matches(&on_lower));
        assert!(filters.matches(&on_upper));
        assert!(!filters.matches(&before));
    }

    #[test]
    fn missing_or_unparseable_date_fails_open() {
        let (filters, _) = parse_filters("[fecha>=2024-01-01] q");
        let absent = FragmentMetadata::default();
        let garbage = FragmentMetadata {
            date: Some("pronto".into()),
            ..Default::default()
        };
        assert!(filters.matches(&absent));
        assert!(filters.matches(&garbage));
    }
}
