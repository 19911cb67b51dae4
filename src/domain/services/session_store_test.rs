use super::SessionStore;
use crate::domain::models::Mode;
use crate::domain::models::SessionPatch;
use crate::domain::models::SessionSummary;

fn seeded() -> SessionStore {
    let mut store = SessionStore::default();
    store.upsert(SessionPatch::new("s-1", Some("First"), Some(Mode::Regular)));
    store.upsert(SessionPatch::new("s-2", Some("Second"), Some(Mode::Ocr)));
    store.upsert(SessionPatch::new("s-3", Some("Third"), Some(Mode::Regular)));
    return store;
}

#[test]
fn it_prepends_unknown_ids() {
    let store = seeded();
    let ids = store
        .list_by_mode(Mode::Regular)
        .iter()
        .map(|e| return e.id.to_string())
        .collect::<Vec<String>>();

    assert_eq!(ids, vec!["s-3".to_string(), "s-1".to_string()]);
}

#[test]
fn it_upserts_idempotently_on_id() {
    let mut store = seeded();
    store.upsert(SessionPatch::new("s-1", Some("Renamed"), Some(Mode::Regular)));
    store.upsert(SessionPatch::new("s-1", Some("Renamed"), Some(Mode::Regular)));

    assert_eq!(store.len(), 3);
    assert_eq!(store.get("s-1").unwrap().title, "Renamed");
}

#[test]
fn it_merges_in_place_preserving_position_and_unpatched_fields() {
    let mut store = seeded();
    store.upsert(SessionPatch::new("s-1", Some("Updated"), None));

    let entry = store.get("s-1").unwrap();
    assert_eq!(entry.title, "Updated");
    assert_eq!(entry.mode, Mode::Regular);

    let ids = store
        .list_by_mode(Mode::Regular)
        .iter()
        .map(|e| return e.id.to_string())
        .collect::<Vec<String>>();
    assert_eq!(ids, vec!["s-3".to_string(), "s-1".to_string()]);
}

#[test]
fn it_defaults_missing_titles_to_new_chat() {
    let mut store = SessionStore::default();
    store.upsert(SessionPatch::new("s-9", None, Some(Mode::Ocr)));
    assert_eq!(store.get("s-9").unwrap().title, "New chat");
}

#[test]
fn it_renames_and_raises_the_typing_flag() {
    let mut store = seeded();
    assert!(store.rename("s-1", "Fresh title"));

    let entry = store.get("s-1").unwrap();
    assert_eq!(entry.title, "Fresh title");
    assert!(entry.just_renamed);
}

#[test]
fn it_treats_identical_renames_as_noops() {
    let mut store = seeded();
    assert!(store.rename("s-1", "Fresh title"));
    store.clear_just_renamed("s-1");

    assert!(!store.rename("s-1", "Fresh title"));
    assert!(!store.get("s-1").unwrap().just_renamed);
}

#[test]
fn it_clamps_long_titles_for_display() {
    let mut store = seeded();
    let long = "x".repeat(80);
    assert!(store.rename("s-1", &long));

    let title = store.get("s-1").unwrap().title.to_string();
    assert_eq!(title.chars().count(), 60);
    assert!(title.ends_with('…'));

    // The clamped form is what no-op comparison runs against.
    assert!(!store.rename("s-1", &long));
}

#[test]
fn it_removes_idempotently() {
    let mut store = seeded();
    store.remove("s-2");
    store.remove("s-2");

    assert_eq!(store.len(), 2);
    assert!(store.get("s-2").is_none());
}

#[test]
fn it_filters_by_mode_without_leaks() {
    let store = seeded();
    for entry in store.list_by_mode(Mode::Ocr) {
        assert_eq!(entry.mode, Mode::Ocr);
    }
    assert_eq!(store.list_by_mode(Mode::Uncensored).len(), 0);
}

#[test]
fn it_carries_typing_flags_across_replace() {
    let mut store = seeded();
    assert!(store.rename("s-1", "Fresh title"));

    store.replace(vec![
        SessionSummary::new("s-1", "Fresh title", Mode::Regular),
        SessionSummary::new("s-4", "Fourth", Mode::Regular),
    ]);

    assert!(store.get("s-1").unwrap().just_renamed);
    assert!(!store.get("s-4").unwrap().just_renamed);
}

#[test]
fn it_clears_the_typing_flag() {
    let mut store = seeded();
    assert!(store.rename("s-1", "Fresh title"));
    store.clear_just_renamed("s-1");
    assert!(!store.get("s-1").unwrap().just_renamed);
}
