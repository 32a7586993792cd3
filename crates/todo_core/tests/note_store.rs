use todo_core::db::open_db_in_memory;
use todo_core::{Note, NoteStore, Priority, PriorityOrder, SqliteNoteStore, TodoRepository};

fn store() -> SqliteNoteStore {
    SqliteNoteStore::new(open_db_in_memory().unwrap())
}

fn titles(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.title.as_str()).collect()
}

#[test]
fn insert_assigns_fresh_increasing_ids() {
    let store = store();
    let draft = Note::new("Pay Rent", "before friday", Priority::High);

    let first = store.insert(&draft).unwrap();
    let second = store
        .insert(&Note::new("Groceries", "milk", Priority::Low))
        .unwrap();

    assert!(first > 0);
    assert!(second > first);

    let listed = store.list_all().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first);
    assert!(listed[0].same_content(&draft));
}

#[test]
fn ids_are_not_reused_after_delete() {
    let store = store();
    let first = store.insert(&Note::new("a", "b", Priority::Low)).unwrap();
    store.delete_by_id(first).unwrap();

    let second = store.insert(&Note::new("c", "d", Priority::Low)).unwrap();
    assert!(second > first);
}

#[test]
fn insert_with_explicit_id_keeps_it() {
    let store = store();
    let id = store
        .insert(&Note::with_id(42, "Restored", "from undo", Priority::Medium))
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(store.get(42).unwrap().unwrap().title, "Restored");
}

#[test]
fn colliding_explicit_id_fails_and_changes_nothing() {
    let store = store();
    let id = store.insert(&Note::new("a", "b", Priority::Low)).unwrap();
    let version = store.version();

    let err = store.insert(&Note::with_id(id, "dup", "dup", Priority::High));
    assert!(err.is_err());
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.get(id).unwrap().unwrap().title, "a");
    assert_eq!(store.version(), version);
}

#[test]
fn update_replaces_every_field_but_id() {
    let store = store();
    let id = store
        .insert(&Note::new("Pay Rent", "before friday", Priority::High))
        .unwrap();

    let edited = Note::with_id(id, "Pay rent", "transfer done", Priority::Low);
    assert!(store.update(&edited).unwrap());
    assert_eq!(store.get(id).unwrap().unwrap(), edited);
}

#[test]
fn update_and_delete_of_missing_id_are_noops() {
    let store = store();
    store.insert(&Note::new("a", "b", Priority::Low)).unwrap();
    store.insert(&Note::new("c", "d", Priority::High)).unwrap();
    let before = store.list_all().unwrap();
    let version = store.version();

    assert!(!store
        .update(&Note::with_id(999, "x", "y", Priority::Medium))
        .unwrap());
    assert!(!store.delete_by_id(999).unwrap());

    assert_eq!(store.list_all().unwrap(), before);
    assert_eq!(store.version(), version);
}

#[test]
fn delete_all_empties_the_table() {
    let store = store();
    for idx in 0..3 {
        store
            .insert(&Note::new(format!("note {idx}"), "body", Priority::Medium))
            .unwrap();
    }

    assert_eq!(store.delete_all().unwrap(), 3);
    assert!(store.list_all().unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.delete_all().unwrap(), 0);
}

#[test]
fn list_by_priority_orders_both_directions_with_id_tiebreak() {
    let store = store();
    store.insert(&Note::new("low-1", "x", Priority::Low)).unwrap();
    store.insert(&Note::new("high-1", "x", Priority::High)).unwrap();
    store.insert(&Note::new("medium", "x", Priority::Medium)).unwrap();
    store.insert(&Note::new("high-2", "x", Priority::High)).unwrap();

    let high_first = store.list_by_priority(PriorityOrder::HighFirst).unwrap();
    assert_eq!(
        titles(&high_first),
        vec!["high-1", "high-2", "medium", "low-1"]
    );

    let low_first = store.list_by_priority(PriorityOrder::LowFirst).unwrap();
    assert_eq!(
        titles(&low_first),
        vec!["low-1", "medium", "high-1", "high-2"]
    );
}

#[test]
fn search_matches_title_substring_ignoring_case() {
    let store = store();
    store
        .insert(&Note::new("Pay Rent", "monthly", Priority::High))
        .unwrap();
    store
        .insert(&Note::new("Parent Meeting", "school", Priority::Medium))
        .unwrap();
    store
        .insert(&Note::new("Groceries", "rent a cart", Priority::Low))
        .unwrap();

    let found = store.search("rent").unwrap();
    assert_eq!(titles(&found), vec!["Pay Rent", "Parent Meeting"]);

    let upper = store.search("RENT").unwrap();
    assert_eq!(upper.len(), 2);
}

#[test]
fn search_treats_wildcards_literally() {
    let store = store();
    store
        .insert(&Note::new("50% off", "sale", Priority::Low))
        .unwrap();
    store
        .insert(&Note::new("500 off", "sale", Priority::Low))
        .unwrap();
    store
        .insert(&Note::new("snake_case", "naming", Priority::Low))
        .unwrap();

    assert_eq!(titles(&store.search("0%").unwrap()), vec!["50% off"]);
    assert_eq!(titles(&store.search("e_c").unwrap()), vec!["snake_case"]);
    assert!(store.search("%%").unwrap().is_empty());
}

#[test]
fn empty_search_pattern_matches_every_note() {
    let store = store();
    store.insert(&Note::new("a", "b", Priority::Low)).unwrap();
    store.insert(&Note::new("c", "d", Priority::Low)).unwrap();

    assert_eq!(store.search("").unwrap().len(), 2);
}

#[test]
fn repository_maps_calls_onto_store() {
    let repo = TodoRepository::new(store());
    let id = repo
        .insert(&Note::new("Pay Rent", "monthly", Priority::Low))
        .unwrap();
    repo.insert(&Note::new("Groceries", "milk", Priority::High))
        .unwrap();

    assert_eq!(repo.fetch_all().unwrap().len(), 2);
    assert_eq!(
        titles(&repo.fetch_sorted_by(PriorityOrder::HighFirst).unwrap()),
        vec!["Groceries", "Pay Rent"]
    );
    assert_eq!(titles(&repo.search("rent").unwrap()), vec!["Pay Rent"]);
    assert!(repo.delete_by_id(id).unwrap());
    assert!(repo.get(id).unwrap().is_none());
    assert_eq!(repo.delete_all().unwrap(), 1);
    assert_eq!(repo.store().subscription_count(), 0);
}
