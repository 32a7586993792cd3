use std::sync::{Arc, Mutex};
use std::thread;
use todo_core::db::open_db_in_memory;
use todo_core::{
    Note, NoteQuery, NoteStore, Priority, PriorityOrder, QuerySnapshot, SqliteNoteStore,
};

type Deliveries = Arc<Mutex<Vec<QuerySnapshot>>>;

fn store() -> SqliteNoteStore {
    SqliteNoteStore::new(open_db_in_memory().unwrap())
}

fn recorder(deliveries: &Deliveries) -> impl FnMut(&QuerySnapshot) + Send + 'static {
    let sink = Arc::clone(deliveries);
    move |snapshot: &QuerySnapshot| sink.lock().unwrap().push(snapshot.clone())
}

#[test]
fn subscribe_delivers_current_snapshot_with_no_prior_mutations() {
    let store = store();
    let deliveries: Deliveries = Arc::default();

    store.subscribe(NoteQuery::All, recorder(&deliveries)).unwrap();

    let seen = deliveries.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].version, 0);
    assert!(seen[0].notes.is_empty());
}

#[test]
fn each_mutation_delivers_exactly_one_post_mutation_snapshot() {
    let store = store();
    let deliveries: Deliveries = Arc::default();
    store.subscribe(NoteQuery::All, recorder(&deliveries)).unwrap();

    let id = store
        .insert(&Note::new("Pay Rent", "monthly", Priority::High))
        .unwrap();
    assert_eq!(deliveries.lock().unwrap().len(), 2);

    store
        .update(&Note::with_id(id, "Pay Rent", "paid", Priority::Low))
        .unwrap();
    store
        .insert(&Note::new("Groceries", "milk", Priority::Medium))
        .unwrap();
    store.delete_by_id(id).unwrap();
    store.delete_all().unwrap();

    let seen = deliveries.lock().unwrap();
    let versions: Vec<u64> = seen.iter().map(|snapshot| snapshot.version).collect();
    assert_eq!(versions, vec![0, 1, 2, 3, 4, 5]);
    let sizes: Vec<usize> = seen.iter().map(QuerySnapshot::len).collect();
    assert_eq!(sizes, vec![0, 1, 1, 2, 1, 0]);
    assert_eq!(seen[2].notes[0].description, "paid");
}

#[test]
fn noop_mutations_deliver_nothing() {
    let store = store();
    let deliveries: Deliveries = Arc::default();
    store.subscribe(NoteQuery::All, recorder(&deliveries)).unwrap();

    store
        .update(&Note::with_id(7, "x", "y", Priority::Low))
        .unwrap();
    store.delete_by_id(7).unwrap();
    store.delete_all().unwrap();

    assert_eq!(deliveries.lock().unwrap().len(), 1);
}

#[test]
fn each_query_shape_receives_its_own_result() {
    let store = store();
    let by_priority: Deliveries = Arc::default();
    let search: Deliveries = Arc::default();
    store
        .subscribe(
            NoteQuery::ByPriority(PriorityOrder::HighFirst),
            recorder(&by_priority),
        )
        .unwrap();
    store
        .subscribe(NoteQuery::Search("rent".to_string()), recorder(&search))
        .unwrap();

    store
        .insert(&Note::new("Groceries", "milk", Priority::Low))
        .unwrap();
    store
        .insert(&Note::new("Pay Rent", "monthly", Priority::High))
        .unwrap();

    let by_priority = by_priority.lock().unwrap();
    let latest = by_priority.last().unwrap();
    assert_eq!(latest.notes[0].title, "Pay Rent");
    assert_eq!(latest.notes[1].title, "Groceries");

    let search = search.lock().unwrap();
    assert_eq!(search.len(), 3);
    assert!(search[1].notes.is_empty());
    assert_eq!(search[2].notes.len(), 1);
    assert_eq!(search[2].query, NoteQuery::Search("rent".to_string()));
}

#[test]
fn unsubscribe_is_idempotent_and_stops_deliveries() {
    let store = store();
    let deliveries: Deliveries = Arc::default();
    let id = store.subscribe(NoteQuery::All, recorder(&deliveries)).unwrap();

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.insert(&Note::new("a", "b", Priority::Low)).unwrap();

    assert_eq!(deliveries.lock().unwrap().len(), 1);
    assert_eq!(store.subscription_count(), 0);
}

#[test]
fn subscribe_once_delivers_one_result_and_registers_nothing() {
    let store = store();
    store
        .insert(&Note::new("Pay Rent", "monthly", Priority::High))
        .unwrap();

    let mut calls = 0;
    store
        .subscribe_once(NoteQuery::Search("pay".to_string()), |snapshot| {
            calls += 1;
            assert_eq!(snapshot.notes.len(), 1);
            assert_eq!(snapshot.version, 1);
        })
        .unwrap();
    store.insert(&Note::new("Pay bills", "x", Priority::Low)).unwrap();

    assert_eq!(calls, 1);
    assert_eq!(store.subscription_count(), 0);
}

#[test]
fn fetch_returns_snapshot_at_current_version() {
    let store = store();
    store.insert(&Note::new("a", "b", Priority::Low)).unwrap();

    let snapshot = store.fetch(&NoteQuery::All).unwrap();
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn concurrent_writers_deliver_versions_in_commit_order() {
    let store = Arc::new(store());
    let deliveries: Deliveries = Arc::default();
    store.subscribe(NoteQuery::All, recorder(&deliveries)).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for idx in 0..10 {
                    store
                        .insert(&Note::new(
                            format!("w{worker}-{idx}"),
                            "body",
                            Priority::Medium,
                        ))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let seen = deliveries.lock().unwrap();
    assert_eq!(seen.len(), 41);
    for (expected, snapshot) in seen.iter().enumerate() {
        assert_eq!(snapshot.version, expected as u64);
        assert_eq!(snapshot.len(), expected);
    }
}
