use super::*;

fn titled(titles: &[&str]) -> Vec<CatalogEntry> {
    titles
        .iter()
        .enumerate()
        .map(|(idx, title)| CatalogEntry::new(idx as i64 + 1, *title))
        .collect()
}

fn titles(entries: &[CatalogEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.title.as_str()).collect()
}

#[test]
fn filter_is_case_insensitive_substring_in_original_order() {
    let entries = titled(&["Gamma", "Alpha", "beta", "Delta", "Epsilon"]);
    let visible = ListProjection::new().with_filter("A").apply(&entries);
    assert_eq!(titles(&visible), ["Gamma", "Alpha", "beta", "Delta"]);
}

#[test]
fn mixed_case_titles_match_and_sort_ascending() {
    let entries = titled(&["Alpha", "beta", "Gamma"]);

    let unsorted = ListProjection::new().with_filter("a").apply(&entries);
    assert_eq!(titles(&unsorted), ["Alpha", "beta", "Gamma"]);

    let sorted = ListProjection::new()
        .with_filter("a")
        .with_sort(true)
        .apply(&entries);
    assert_eq!(titles(&sorted), ["Alpha", "beta", "Gamma"]);
}

#[test]
fn sort_ignores_case_and_keeps_ties_in_arrival_order() {
    let mut entries = titled(&["zeta", "Beta", "alpha", "beta"]);
    entries[3].id = shared::domain::EntryId(40);
    let sorted = ListProjection::new().with_sort(true).apply(&entries);
    assert_eq!(titles(&sorted), ["alpha", "Beta", "beta", "zeta"]);
    assert_eq!(sorted[2].id, shared::domain::EntryId(40));
}

#[test]
fn empty_filter_keeps_everything_and_source_is_untouched() {
    let entries = titled(&["b", "a"]);
    let mut projection = ListProjection::new();
    projection.toggle_sort();
    let sorted = projection.apply(&entries);

    assert_eq!(titles(&sorted), ["a", "b"]);
    assert_eq!(titles(&entries), ["b", "a"]);

    projection.toggle_sort();
    assert_eq!(titles(&projection.apply(&entries)), ["b", "a"]);
}

#[test]
fn filter_without_matches_yields_empty_view() {
    let entries = titled(&["Alpha", "Beta"]);
    assert!(ListProjection::new()
        .with_filter("zz")
        .apply(&entries)
        .is_empty());
}
