//! Track persistence: identity, rolling summary, append-only history.

use std::sync::Arc;

use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::state::{SessionState, LAST_TRACK_KEY};
use crate::store::Store;
use crate::types::{Message, Role};
use crate::utils::unix_now;

/// Default number of history rows replayed per turn.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

// ─────────────────────────────────────────────
// Track
// ─────────────────────────────────────────────

/// A named conversation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub summary: String,
    /// Unix seconds.
    pub last_active: i64,
}

impl Track {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            summary: row.get(2)?,
            last_active: row.get(3)?,
        })
    }
}

// ─────────────────────────────────────────────
// TrackManager
// ─────────────────────────────────────────────

/// Owns the `tracks` and `messages` tables.
#[derive(Clone, Debug)]
pub struct TrackManager {
    store: Arc<Store>,
}

impl TrackManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Get a track by name, creating it with an empty summary if absent.
    ///
    /// Check and insert happen under one lock, so concurrent callers never
    /// produce two rows for the same name.
    pub fn get_or_create(&self, name: &str) -> Result<Track> {
        let conn = self.store.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tracks (name, summary, last_active) VALUES (?1, '', ?2)",
            params![name, unix_now()],
        )?;
        if inserted > 0 {
            info!(track = name, "created track");
        }
        let track = conn.query_row(
            "SELECT id, name, summary, last_active FROM tracks WHERE name = ?1",
            params![name],
            Track::from_row,
        )?;
        Ok(track)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Track>> {
        let conn = self.store.conn()?;
        let track = conn
            .query_row(
                "SELECT id, name, summary, last_active FROM tracks WHERE name = ?1",
                params![name],
                Track::from_row,
            )
            .optional()?;
        Ok(track)
    }

    pub fn get_by_id(&self, track_id: i64) -> Result<Option<Track>> {
        let conn = self.store.conn()?;
        let track = conn
            .query_row(
                "SELECT id, name, summary, last_active FROM tracks WHERE id = ?1",
                params![track_id],
                Track::from_row,
            )
            .optional()?;
        Ok(track)
    }

    /// All tracks, ordered by name.
    pub fn list_tracks(&self) -> Result<Vec<Track>> {
        let conn = self.store.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, summary, last_active FROM tracks ORDER BY name")?;
        let tracks = stmt
            .query_map([], Track::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    /// Touch the track and make it the last active one.
    pub fn mark_active(&self, state: &mut SessionState, track_id: i64) -> Result<()> {
        {
            let conn = self.store.conn()?;
            conn.execute(
                "UPDATE tracks SET last_active = ?1 WHERE id = ?2",
                params![unix_now(), track_id],
            )?;
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![LAST_TRACK_KEY, track_id.to_string()],
            )?;
        }
        state.last_track_id = Some(track_id);
        debug!(track_id, "marked track active");
        Ok(())
    }

    /// The track the state points at, if it still exists.
    pub fn get_last_active(&self, state: &SessionState) -> Result<Option<Track>> {
        match state.last_track_id {
            Some(id) => self.get_by_id(id),
            None => Ok(None),
        }
    }

    /// Replace the rolling summary. Nothing calls this automatically.
    pub fn update_summary(&self, track_id: i64, summary: &str) -> Result<()> {
        let conn = self.store.conn()?;
        conn.execute(
            "UPDATE tracks SET summary = ?1 WHERE id = ?2",
            params![summary, track_id],
        )?;
        Ok(())
    }

    /// Rename in place. Fails if `new_name` is taken.
    pub fn rename(&self, track_id: i64, new_name: &str) -> Result<()> {
        let conn = self.store.conn()?;
        conn.execute(
            "UPDATE tracks SET name = ?1 WHERE id = ?2",
            params![new_name, track_id],
        )?;
        info!(track_id, new_name, "renamed track");
        Ok(())
    }

    /// Hard-delete the track, its messages and its memories.
    pub fn archive(&self, track_id: i64) -> Result<()> {
        let mut conn = self.store.conn()?;
        let tx = conn.transaction()?;
        // Children first: messages and memories reference tracks(id).
        tx.execute("DELETE FROM messages WHERE track_id = ?1", params![track_id])?;
        tx.execute("DELETE FROM memories WHERE track_id = ?1", params![track_id])?;
        tx.execute("DELETE FROM tracks WHERE id = ?1", params![track_id])?;
        tx.commit()?;
        info!(track_id, "archived track");
        Ok(())
    }

    /// Append one row to the track's history.
    pub fn append_message(&self, track_id: i64, role: Role, content: &str) -> Result<()> {
        let conn = self.store.conn()?;
        conn.execute(
            "INSERT INTO messages (track_id, role, content, ts) VALUES (?1, ?2, ?3, ?4)",
            params![track_id, role.as_str(), content, unix_now()],
        )?;
        Ok(())
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent_messages(&self, track_id: i64, limit: usize) -> Result<Vec<Message>> {
        let conn = self.store.conn()?;
        let mut stmt = conn.prepare(
            "SELECT role, content FROM messages WHERE track_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![track_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut messages = Vec::with_capacity(rows.len());
        for (role, content) in rows.into_iter().rev() {
            messages.push(Message::new(role.parse()?, content));
        }
        Ok(messages)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TrackManager {
        TrackManager::new(Arc::new(Store::open_in_memory().unwrap()))
    }

    fn message_count(tracks: &TrackManager, track_id: i64) -> i64 {
        let conn = tracks.store().conn().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE track_id = ?1",
            params![track_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let tracks = manager();
        let a = tracks.get_or_create("work").unwrap();
        let b = tracks.get_or_create("work").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.summary, "");
        assert_eq!(tracks.list_tracks().unwrap().len(), 1);
    }

    #[test]
    fn test_list_tracks_sorted_by_name() {
        let tracks = manager();
        tracks.get_or_create("zeta").unwrap();
        tracks.get_or_create("alpha").unwrap();
        tracks.get_or_create("mid").unwrap();
        let names: Vec<String> = tracks.list_tracks().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_recent_messages_chronological_and_limited() {
        let tracks = manager();
        let track = tracks.get_or_create("default").unwrap();
        for i in 0..5 {
            tracks
                .append_message(track.id, Role::User, &format!("m{i}"))
                .unwrap();
        }
        let recent = tracks.recent_messages(track.id, 3).unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);

        let all = tracks.recent_messages(track.id, 50).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "m0");
    }

    #[test]
    fn test_recent_messages_preserves_roles() {
        let tracks = manager();
        let track = tracks.get_or_create("t").unwrap();
        tracks.append_message(track.id, Role::User, "q").unwrap();
        tracks.append_message(track.id, Role::Assistant, "a").unwrap();
        let recent = tracks.recent_messages(track.id, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(recent, vec![Message::user("q"), Message::assistant("a")]);
    }

    #[test]
    fn test_history_is_per_track() {
        let tracks = manager();
        let a = tracks.get_or_create("a").unwrap();
        let b = tracks.get_or_create("b").unwrap();
        tracks.append_message(a.id, Role::User, "for a").unwrap();
        assert!(tracks.recent_messages(b.id, 10).unwrap().is_empty());
    }

    #[test]
    fn test_mark_active_and_get_last_active() {
        let tracks = manager();
        let mut state = SessionState::default();
        assert!(tracks.get_last_active(&state).unwrap().is_none());

        let track = tracks.get_or_create("work").unwrap();
        tracks.mark_active(&mut state, track.id).unwrap();
        assert_eq!(state.last_track_id, Some(track.id));
        assert_eq!(tracks.get_last_active(&state).unwrap().unwrap().name, "work");

        // Persisted for the next process
        let restored = SessionState::restore(tracks.store()).unwrap();
        assert_eq!(restored.last_track_id, Some(track.id));
    }

    #[test]
    fn test_rename() {
        let tracks = manager();
        let track = tracks.get_or_create("old").unwrap();
        tracks.rename(track.id, "new").unwrap();
        assert!(tracks.get_by_name("old").unwrap().is_none());
        assert_eq!(tracks.get_by_name("new").unwrap().unwrap().id, track.id);
    }

    #[test]
    fn test_rename_to_existing_name_fails() {
        let tracks = manager();
        let a = tracks.get_or_create("a").unwrap();
        tracks.get_or_create("b").unwrap();
        assert!(tracks.rename(a.id, "b").is_err());
    }

    #[test]
    fn test_update_summary() {
        let tracks = manager();
        let track = tracks.get_or_create("t").unwrap();
        tracks.update_summary(track.id, "talked about rust").unwrap();
        assert_eq!(
            tracks.get_by_id(track.id).unwrap().unwrap().summary,
            "talked about rust"
        );
    }

    #[test]
    fn test_archive_cascades() {
        let tracks = manager();
        let track = tracks.get_or_create("gone").unwrap();
        tracks.append_message(track.id, Role::User, "hi").unwrap();
        {
            let conn = tracks.store().conn().unwrap();
            conn.execute(
                "INSERT INTO memories (track_id, type, content, updated_at) VALUES (?1, 'fact', 'x', 0)",
                params![track.id],
            )
            .unwrap();
        }

        tracks.archive(track.id).unwrap();

        assert!(tracks.get_by_name("gone").unwrap().is_none());
        assert_eq!(message_count(&tracks, track.id), 0);
        let conn = tracks.store().conn().unwrap();
        let memories: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM memories WHERE track_id = ?1",
                params![track.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(memories, 0);
    }

    #[test]
    fn test_archive_track_with_history_on_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("clawless.db")).unwrap());
        let tracks = TrackManager::new(store);
        let track = tracks.get_or_create("work").unwrap();
        tracks.append_message(track.id, Role::User, "hi").unwrap();
        tracks.append_message(track.id, Role::Assistant, "hello").unwrap();

        tracks.archive(track.id).unwrap();

        assert!(tracks.get_by_name("work").unwrap().is_none());
        assert!(tracks.get_by_id(track.id).unwrap().is_none());
        assert_eq!(message_count(&tracks, track.id), 0);
    }

    #[test]
    fn test_get_or_create_after_archive_is_new_identity() {
        let tracks = manager();
        let first = tracks.get_or_create("x").unwrap();
        tracks.archive(first.id).unwrap();
        let second = tracks.get_or_create("x").unwrap();
        assert_ne!(first.id, second.id);
        assert!(tracks.recent_messages(second.id, 10).unwrap().is_empty());
    }
}
