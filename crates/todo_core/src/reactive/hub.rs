//! Query hub: routes table changes to query subscribers.
//!
//! The hub does not touch storage. Whoever owns the table hands it an
//! evaluator, and the hub runs each distinct subscribed query once per
//! publish and delivers the shared snapshot to that query's subscribers.

use crate::model::note::Note;
use crate::reactive::query::{NoteQuery, QuerySnapshot};
use crate::reactive::subscription::{Observer, SubscriptionId, Subscribers};
use log::{debug, error};
use std::collections::HashMap;
use std::fmt::Display;

#[derive(Default)]
pub struct QueryHub {
    subscribers: Subscribers<NoteQuery, QuerySnapshot>,
}

impl QueryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for `query` and hands it `initial` right away.
    ///
    /// `initial` must be the query result at the current state version.
    pub fn subscribe(
        &mut self,
        query: NoteQuery,
        initial: &QuerySnapshot,
        observer: Observer<QuerySnapshot>,
    ) -> SubscriptionId {
        let id = self.subscribers.subscribe(query, observer);
        self.subscribers.notify(id, initial);
        debug!(
            "event=query_subscribe module=reactive status=ok subscription_id={} query={} version={}",
            id,
            initial.query.kind(),
            initial.version
        );
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.unsubscribe(id);
        debug!(
            "event=query_unsubscribe module=reactive status=ok subscription_id={} removed={}",
            id, removed
        );
        removed
    }

    /// Re-evaluates every subscribed query and delivers the results.
    ///
    /// A query whose evaluation fails is logged and skipped; its subscribers
    /// keep their previous snapshot. Returns the number of deliveries.
    pub fn publish<E, F>(&mut self, version: u64, mut evaluate: F) -> usize
    where
        E: Display,
        F: FnMut(&NoteQuery) -> Result<Vec<Note>, E>,
    {
        let mut snapshots: HashMap<NoteQuery, QuerySnapshot> = HashMap::new();
        for query in self.subscribers.keys() {
            if snapshots.contains_key(query) {
                continue;
            }
            match evaluate(query) {
                Ok(notes) => {
                    snapshots.insert(
                        query.clone(),
                        QuerySnapshot {
                            query: query.clone(),
                            version,
                            notes,
                        },
                    );
                }
                Err(err) => {
                    error!(
                        "event=query_publish module=reactive status=error query={} version={} error={}",
                        query.kind(),
                        version,
                        err
                    );
                }
            }
        }

        let delivered = self.subscribers.notify_with(|query| snapshots.get(query));
        debug!(
            "event=query_publish module=reactive status=ok version={} queries={} deliveries={}",
            version,
            snapshots.len(),
            delivered
        );
        delivered
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::QueryHub;
    use crate::model::note::{Note, Priority, PriorityOrder};
    use crate::reactive::query::{NoteQuery, QuerySnapshot};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(u64, usize)>>>;

    fn observer(seen: &Seen) -> Box<dyn FnMut(&QuerySnapshot) + Send> {
        let sink = Arc::clone(seen);
        Box::new(move |snapshot: &QuerySnapshot| {
            sink.lock()
                .unwrap()
                .push((snapshot.version, snapshot.notes.len()))
        })
    }

    fn snapshot(query: NoteQuery, version: u64, notes: Vec<Note>) -> QuerySnapshot {
        QuerySnapshot {
            query,
            version,
            notes,
        }
    }

    #[test]
    fn subscribe_delivers_initial_snapshot_immediately() {
        let mut hub = QueryHub::new();
        let seen: Seen = Arc::default();
        hub.subscribe(
            NoteQuery::All,
            &snapshot(NoteQuery::All, 0, Vec::new()),
            observer(&seen),
        );
        assert_eq!(*seen.lock().unwrap(), vec![(0, 0)]);
    }

    #[test]
    fn publish_evaluates_each_query_once() {
        let mut hub = QueryHub::new();
        let seen: Seen = Arc::default();
        let initial = snapshot(NoteQuery::All, 0, Vec::new());
        hub.subscribe(NoteQuery::All, &initial, observer(&seen));
        hub.subscribe(NoteQuery::All, &initial, observer(&seen));
        let by_priority = NoteQuery::ByPriority(PriorityOrder::HighFirst);
        hub.subscribe(
            by_priority.clone(),
            &snapshot(by_priority, 0, Vec::new()),
            observer(&seen),
        );

        let mut evaluations = 0;
        let delivered = hub.publish(1, |_query| {
            evaluations += 1;
            Ok::<_, String>(vec![Note::with_id(1, "a", "b", Priority::Low)])
        });

        assert_eq!(evaluations, 2);
        assert_eq!(delivered, 3);
        assert_eq!(seen.lock().unwrap().len(), 6);
    }

    #[test]
    fn failed_query_is_skipped_without_affecting_others() {
        let mut hub = QueryHub::new();
        let all_seen: Seen = Arc::default();
        let search_seen: Seen = Arc::default();
        hub.subscribe(
            NoteQuery::All,
            &snapshot(NoteQuery::All, 0, Vec::new()),
            observer(&all_seen),
        );
        let search = NoteQuery::Search("x".to_string());
        hub.subscribe(
            search.clone(),
            &snapshot(search, 0, Vec::new()),
            observer(&search_seen),
        );

        hub.publish(1, |query| match query {
            NoteQuery::Search(_) => Err("boom".to_string()),
            _ => Ok(Vec::new()),
        });

        assert_eq!(*all_seen.lock().unwrap(), vec![(0, 0), (1, 0)]);
        assert_eq!(*search_seen.lock().unwrap(), vec![(0, 0)]);
    }

    #[test]
    fn unsubscribed_observer_gets_nothing_further() {
        let mut hub = QueryHub::new();
        let seen: Seen = Arc::default();
        let id = hub.subscribe(
            NoteQuery::All,
            &snapshot(NoteQuery::All, 0, Vec::new()),
            observer(&seen),
        );
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));

        hub.publish(1, |_| Ok::<_, String>(Vec::new()));
        assert_eq!(*seen.lock().unwrap(), vec![(0, 0)]);
        assert_eq!(hub.subscription_count(), 0);
    }
}
