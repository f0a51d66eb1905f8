use super::*;

fn store() -> FilterStore {
    FilterStore::new(FilterCriteria::new(), Duration::from_millis(300))
}

#[test]
fn criteria_builders_return_new_values() {
    let base = FilterCriteria::new();
    let narrowed = base.with_category("status", "pending");
    assert_eq!(base.category("status"), None);
    assert_eq!(narrowed.category("status"), Some("pending"));
    assert_ne!(base, narrowed);
}

#[test]
fn all_sentinel_and_blank_values_remove_the_category() {
    let narrowed = FilterCriteria::new().with_category("status", "pending");
    assert_eq!(narrowed.with_category("status", "all"), FilterCriteria::new());
    assert_eq!(narrowed.with_category("status", "  "), FilterCriteria::new());
}

#[test]
fn search_term_ignores_whitespace() {
    assert_eq!(FilterCriteria::new().with_search("   ").search_term(), None);
    assert_eq!(
        FilterCriteria::new().with_search("  zakat ").search_term(),
        Some("zakat")
    );
}

#[test]
fn only_latest_ticket_commits() {
    let mut store = store();
    let first = store.set_raw_input("a");
    let second = store.set_raw_input("ab");
    let third = store.set_raw_input("abc");

    assert_eq!(store.commit_pending(first), None);
    assert_eq!(store.commit_pending(second), None);
    let committed = store.commit_pending(third).expect("latest ticket commits");

    assert_eq!(committed, FilterCriteria::new().with_search("abc"));
    assert_eq!(store.committed().search_text(), "abc");
    assert!(!store.has_pending());
}

#[test]
fn committing_an_unchanged_search_is_not_a_change() {
    let mut store = store();
    let ticket = store.set_raw_input("");
    assert_eq!(store.commit_pending(ticket), None);
}

#[test]
fn trailing_whitespace_is_not_a_search_change() {
    let mut store = store();
    let ticket = store.set_raw_input("abc");
    assert!(store.commit_pending(ticket).is_some());

    let ticket = store.set_raw_input("abc ");
    assert_eq!(store.commit_pending(ticket), None);
    let ticket = store.set_raw_input("  abc");
    assert_eq!(store.commit_pending(ticket), None);
    assert_eq!(store.committed().search_text(), "abc");
}

#[test]
fn raw_search_reports_pending_text_before_commit() {
    let mut store = store();
    store.set_raw_input("zak");
    assert_eq!(store.raw_search(), "zak");
    assert_eq!(store.committed().search_text(), "");
}

#[test]
fn select_changes_commit_immediately_and_keep_pending_search() {
    let mut store = store();
    let ticket = store.set_raw_input("rent");
    let committed = store
        .set_category("status", "approved")
        .expect("category commits");
    assert_eq!(committed.search_text(), "");
    assert_eq!(committed.category("status"), Some("approved"));

    let committed = store.commit_pending(ticket).expect("search still commits");
    assert_eq!(committed.search_text(), "rent");
    assert_eq!(committed.category("status"), Some("approved"));
}

#[test]
fn clear_restores_defaults_and_invalidates_pending_search() {
    let defaults = FilterCriteria::new().with_category("status", "pending");
    let mut store = FilterStore::new(defaults.clone(), Duration::from_millis(500));
    store.set_flag("is_urgent", true).expect("flag commits");
    let ticket = store.set_raw_input("late");

    assert_eq!(store.clear(), Some(defaults.clone()));
    assert_eq!(store.committed(), &defaults);
    assert_eq!(store.commit_pending(ticket), None);
    assert_eq!(store.committed(), &defaults);
}

#[test]
fn flag_toggle_and_clear() {
    let mut store = store();
    assert!(store.set_flag("appeal_linked", true).is_some());
    assert!(store.set_flag("appeal_linked", true).is_none());
    assert_eq!(store.committed().flag("appeal_linked"), Some(true));
    assert!(store.clear_flag("appeal_linked").is_some());
    assert_eq!(store.committed().flag("appeal_linked"), None);
}
