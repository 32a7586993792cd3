//! SQLite-backed note store.

use super::{NoteStore, StoreError, StoreResult};
use crate::model::note::{Note, NoteId, Priority, PriorityOrder, UNASSIGNED_NOTE_ID};
use crate::reactive::{NoteQuery, QueryHub, QuerySnapshot, SubscriptionId};
use log::{debug, error, info};
use rusqlite::{params, Connection, Row};
use std::sync::{Mutex, MutexGuard, PoisonError};

const NOTE_SELECT_SQL: &str = "SELECT id, title, description, priority FROM notes";

const PRIORITY_RANK_SQL: &str = "CASE priority
    WHEN 'high' THEN 0
    WHEN 'medium' THEN 1
    ELSE 2
END";

/// Note store over one SQLite connection.
///
/// The connection, the query hub and the state version sit behind a single
/// mutex, so a write, the re-evaluation of observed queries and their
/// delivery happen as one step.
pub struct SqliteNoteStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    conn: Connection,
    hub: QueryHub,
    version: u64,
}

impl StoreInner {
    fn snapshot(&self, query: &NoteQuery) -> StoreResult<QuerySnapshot> {
        Ok(QuerySnapshot {
            query: query.clone(),
            version: self.version,
            notes: run_query(&self.conn, query)?,
        })
    }

    fn commit_published(&mut self, event: &'static str) {
        self.version += 1;
        let StoreInner { conn, hub, version } = self;
        let conn = &*conn;
        let deliveries = hub.publish(*version, |query| run_query(conn, query));
        debug!(
            "event={event} module=store status=published version={} deliveries={}",
            version, deliveries
        );
    }
}

impl SqliteNoteStore {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                conn,
                hub: QueryHub::new(),
                version: 0,
            }),
        }
    }

    /// Number of committed changes so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().hub.subscription_count()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // An observer panic must not take the note table down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NoteStore for SqliteNoteStore {
    fn insert(&self, note: &Note) -> StoreResult<NoteId> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let inserted = if note.id == UNASSIGNED_NOTE_ID {
            tx.execute(
                "INSERT INTO notes (title, description, priority) VALUES (?1, ?2, ?3);",
                params![
                    note.title.as_str(),
                    note.description.as_str(),
                    note.priority.as_db_str()
                ],
            )
        } else {
            tx.execute(
                "INSERT INTO notes (id, title, description, priority) VALUES (?1, ?2, ?3, ?4);",
                params![
                    note.id,
                    note.title.as_str(),
                    note.description.as_str(),
                    note.priority.as_db_str()
                ],
            )
        };
        inserted.map_err(|err| log_write_error("note_insert", err))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=note_insert module=store status=ok note_id={} explicit_id={}",
            id,
            note.is_assigned()
        );
        inner.commit_published("note_insert");
        Ok(id)
    }

    fn update(&self, note: &Note) -> StoreResult<bool> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let changed = tx
            .execute(
                "UPDATE notes
                 SET
                    title = ?1,
                    description = ?2,
                    priority = ?3
                 WHERE id = ?4;",
                params![
                    note.title.as_str(),
                    note.description.as_str(),
                    note.priority.as_db_str(),
                    note.id
                ],
            )
            .map_err(|err| log_write_error("note_update", err))?;
        tx.commit()?;

        if changed == 0 {
            debug!(
                "event=note_update module=store status=noop note_id={} reason=not_found",
                note.id
            );
            return Ok(false);
        }

        info!("event=note_update module=store status=ok note_id={}", note.id);
        inner.commit_published("note_update");
        Ok(true)
    }

    fn delete_by_id(&self, id: NoteId) -> StoreResult<bool> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let changed = tx
            .execute("DELETE FROM notes WHERE id = ?1;", [id])
            .map_err(|err| log_write_error("note_delete", err))?;
        tx.commit()?;

        if changed == 0 {
            debug!(
                "event=note_delete module=store status=noop note_id={} reason=not_found",
                id
            );
            return Ok(false);
        }

        info!("event=note_delete module=store status=ok note_id={}", id);
        inner.commit_published("note_delete");
        Ok(true)
    }

    fn delete_all(&self) -> StoreResult<usize> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let removed = tx
            .execute("DELETE FROM notes;", [])
            .map_err(|err| log_write_error("notes_clear", err))?;
        tx.commit()?;

        info!("event=notes_clear module=store status=ok removed={}", removed);
        if removed > 0 {
            inner.commit_published("notes_clear");
        }
        Ok(removed)
    }

    fn get(&self, id: NoteId) -> StoreResult<Option<Note>> {
        let inner = self.lock();
        let mut stmt = inner
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn count(&self) -> StoreResult<usize> {
        let inner = self.lock();
        let count: i64 = inner
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count {count}")))
    }

    fn list_all(&self) -> StoreResult<Vec<Note>> {
        run_query(&self.lock().conn, &NoteQuery::All)
    }

    fn list_by_priority(&self, order: PriorityOrder) -> StoreResult<Vec<Note>> {
        run_query(&self.lock().conn, &NoteQuery::ByPriority(order))
    }

    fn search(&self, pattern: &str) -> StoreResult<Vec<Note>> {
        run_query(&self.lock().conn, &NoteQuery::Search(pattern.to_string()))
    }

    fn fetch(&self, query: &NoteQuery) -> StoreResult<QuerySnapshot> {
        self.lock().snapshot(query)
    }

    fn subscribe<F>(&self, query: NoteQuery, observer: F) -> StoreResult<SubscriptionId>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static,
    {
        let mut inner = self.lock();
        let initial = inner.snapshot(&query)?;
        Ok(inner.hub.subscribe(query, &initial, Box::new(observer)))
    }

    fn subscribe_once<F>(&self, query: NoteQuery, observer: F) -> StoreResult<()>
    where
        F: FnOnce(&QuerySnapshot),
    {
        let inner = self.lock();
        let snapshot = inner.snapshot(&query)?;
        debug!(
            "event=query_once module=store status=ok query={} version={} rows={}",
            query.kind(),
            snapshot.version,
            snapshot.len()
        );
        observer(&snapshot);
        Ok(())
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().hub.unsubscribe(id)
    }
}

fn run_query(conn: &Connection, query: &NoteQuery) -> StoreResult<Vec<Note>> {
    match query {
        NoteQuery::All => collect_notes(conn, &format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"), []),
        NoteQuery::ByPriority(order) => {
            let direction = match order {
                PriorityOrder::HighFirst => "ASC",
                PriorityOrder::LowFirst => "DESC",
            };
            collect_notes(
                conn,
                &format!("{NOTE_SELECT_SQL} ORDER BY {PRIORITY_RANK_SQL} {direction}, id ASC;"),
                [],
            )
        }
        NoteQuery::Search(pattern) => collect_notes(
            conn,
            &format!("{NOTE_SELECT_SQL} WHERE title LIKE ?1 ESCAPE '\\' ORDER BY id ASC;"),
            [format!("%{}%", escape_like_pattern(pattern))],
        ),
    }
}

fn collect_notes<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<Note>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(row)?);
    }
    Ok(notes)
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let priority_text: String = row.get("priority")?;
    let priority = Priority::from_db_str(&priority_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid priority `{priority_text}` in notes.priority"
        ))
    })?;

    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
    })
}

/// Escapes LIKE wildcards so the pattern matches literally.
fn escape_like_pattern(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn log_write_error(event: &'static str, err: rusqlite::Error) -> rusqlite::Error {
    error!(
        "event={event} module=store status=error error_code=write_failed error={}",
        err
    );
    err
}

#[cfg(test)]
mod tests {
    use super::escape_like_pattern;

    #[test]
    fn escape_like_pattern_neutralizes_wildcards() {
        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
        assert_eq!(escape_like_pattern("rent"), "rent");
    }
}
