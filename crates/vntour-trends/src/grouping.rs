//! Partitioning keywords into anchored query groups.

use std::collections::HashSet;

use vntour_core::{fold_accents, sanitize_keyword};

use crate::types::TrendGroup;

/// Google Trends compares at most five terms per request.
pub const MAX_TERMS_PER_REQUEST: usize = 5;

/// Keywords this short are dropped; Trends returns noise for them.
const MIN_KEYWORD_CHARS: usize = 3;

/// Sanitizes, filters, and deduplicates keywords, preserving first-seen order.
///
/// Keywords equal to `anchor` (accent-insensitively) are removed so the anchor
/// appears exactly once per group.
#[must_use]
pub fn prepare_keywords(raw: &[String], anchor: Option<&str>) -> Vec<String> {
    let anchor_key = anchor.map(fold_accents);
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for keyword in raw {
        let cleaned = sanitize_keyword(keyword);
        if cleaned.chars().count() < MIN_KEYWORD_CHARS {
            continue;
        }
        if anchor_key.as_deref() == Some(fold_accents(&cleaned).as_str()) {
            tracing::debug!(keyword = %cleaned, "dropping keyword identical to anchor");
            continue;
        }
        if seen.insert(cleaned.clone()) {
            keywords.push(cleaned);
        }
    }
    keywords
}

/// Splits `keywords` into ordered groups of at most `group_size` destinations.
///
/// With an anchor the group size is capped at four so anchor plus destinations
/// fit in one request; without one it is capped at five. Indices are 1-based.
#[must_use]
pub fn build_groups(keywords: &[String], anchor: Option<&str>, group_size: usize) -> Vec<TrendGroup> {
    let cap = if anchor.is_some() {
        MAX_TERMS_PER_REQUEST - 1
    } else {
        MAX_TERMS_PER_REQUEST
    };
    let size = group_size.clamp(1, cap);

    keywords
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| TrendGroup {
            index: i + 1,
            destinations: chunk.to_vec(),
            anchor: anchor.map(str::to_owned),
        })
        .collect()
}

/// Selects groups `start..=end` (1-based, inclusive). Missing bounds mean the
/// first and last group respectively; out-of-range bounds are clamped.
#[must_use]
pub fn select_groups(groups: &[TrendGroup], start: Option<usize>, end: Option<usize>) -> &[TrendGroup] {
    let len = groups.len();
    let first = start.unwrap_or(1).max(1);
    let last = end.unwrap_or(len).min(len);
    if first > last {
        return &[];
    }
    &groups[first - 1..last]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn four_destinations_form_one_anchored_group() {
        let keywords = strings(&["Hạ Long", "Phú Quốc", "Đà Lạt", "Sa Pa"]);
        let groups = build_groups(&keywords, Some("Rau má"), 4);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].index, 1);
        assert_eq!(
            groups[0].keywords(),
            strings(&["Rau má", "Hạ Long", "Phú Quốc", "Đà Lạt", "Sa Pa"])
        );
    }

    #[test]
    fn every_group_has_one_anchor_and_at_most_four_destinations() {
        let keywords: Vec<String> = (0..23).map(|i| format!("Điểm {i:02}")).collect();
        for requested in [1, 3, 4, 5, 10] {
            let groups = build_groups(&keywords, Some("Rau má"), requested);
            let total: usize = groups.iter().map(|g| g.destinations.len()).sum();
            assert_eq!(total, keywords.len());
            for group in &groups {
                assert!(group.destinations.len() <= 4);
                assert!(!group.destinations.is_empty());
                let anchors = group.keywords().iter().filter(|k| *k == "Rau má").count();
                assert_eq!(anchors, 1, "group {} must carry the anchor once", group.index);
            }
        }
    }

    #[test]
    fn unanchored_groups_may_hold_five() {
        let keywords: Vec<String> = (0..7).map(|i| format!("Điểm {i}")).collect();
        let groups = build_groups(&keywords, None, 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].destinations.len(), 5);
        assert!(groups[0].anchor.is_none());
    }

    #[test]
    fn prepare_keywords_dedupes_filters_and_drops_anchor() {
        let raw = strings(&["Sa Pa ", "Sa Pa", "HN", "rau ma", "Đà Lạt,", "Rau má"]);
        let prepared = prepare_keywords(&raw, Some("Rau má"));
        assert_eq!(prepared, strings(&["Sa Pa", "Đà Lạt"]));
    }

    #[test]
    fn select_groups_is_one_based_and_inclusive() {
        let keywords: Vec<String> = (0..20).map(|i| format!("Điểm {i}")).collect();
        let groups = build_groups(&keywords, Some("Rau má"), 4);
        assert_eq!(groups.len(), 5);

        let subset = select_groups(&groups, Some(2), Some(3));
        let indices: Vec<usize> = subset.iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![2, 3]);

        assert_eq!(select_groups(&groups, None, None).len(), 5);
        assert_eq!(select_groups(&groups, Some(4), Some(99)).len(), 2);
        assert!(select_groups(&groups, Some(6), None).is_empty());
        assert!(select_groups(&groups, Some(3), Some(2)).is_empty());
    }
}
