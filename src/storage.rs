use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace, warn};

use crate::{
    generate_id, Clock, Diagnostic, DiagnosticSource, KeyValueStore, Note, NoteDraft,
    NotePatch, Result, Scope, SharedSink, SharedStore, SystemClock,
};

/// Owns the note collection of the active identity scope.
///
/// Every mutation is applied in memory first and then flushed in full to the
/// key-value store under the scope's key. Storage failures never reach the
/// caller: they are reported to the diagnostic sink and the store keeps
/// working from its in-memory state.
pub struct NoteStore {
    /// Scope whose collection is currently loaded
    scope: Scope,

    /// The collection, most recently created first
    notes: Vec<Note>,

    /// Backend the collection is flushed to
    storage: SharedStore,

    /// Receives swallowed storage failures
    diagnostics: SharedSink,

    clock: Arc<dyn Clock>,
}

impl NoteStore {
    /// Opens the store for `scope`, loading whatever is persisted for it.
    pub fn open(scope: Scope, storage: SharedStore, diagnostics: SharedSink) -> Self {
        Self::with_clock(scope, storage, diagnostics, Arc::new(SystemClock))
    }

    pub fn with_clock(
        scope: Scope,
        storage: SharedStore,
        diagnostics: SharedSink,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notes = load_collection(storage.as_ref(), &scope, &diagnostics);
        info!("Opened note store for scope {} ({} notes)", scope, notes.len());
        Self {
            scope,
            notes,
            storage,
            diagnostics,
            clock,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The collection in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Retrieves a note by its ID
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Replaces the active collection with the one persisted for `scope`.
    ///
    /// Nothing is merged: the previous collection was already flushed by the
    /// mutation that last changed it.
    pub fn switch_scope(&mut self, scope: Scope) {
        if scope == self.scope {
            trace!("Scope {} already active", scope);
            return;
        }
        info!("Switching note scope from {} to {}", self.scope, scope);
        self.notes = load_collection(self.storage.as_ref(), &scope, &self.diagnostics);
        self.scope = scope;
    }

    /// Inserts a new note at the front of the collection and returns its id.
    pub fn create(&mut self, draft: NoteDraft) -> String {
        let id = self.unique_id();
        let note = Note::from_draft(id.clone(), draft, self.clock.now());
        info!("Creating note {} in scope {}", id, self.scope);
        self.notes.insert(0, note);
        self.persist();
        id
    }

    /// Merges `patch` into the note with `id`.
    ///
    /// Returns `false`, without touching storage, when no such note exists.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> bool {
        let now = self.clock.now();
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            debug!("Update ignored, no note {} in scope {}", id, self.scope);
            return false;
        };

        let stamp = next_update_stamp(note.updated_at, now);
        note.apply(patch, stamp);
        info!("Updated note {}", id);
        self.persist();
        true
    }

    /// Removes the note with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!("Delete ignored, no note {} in scope {}", id, self.scope);
            return false;
        }
        info!("Deleted note {}", id);
        self.persist();
        true
    }

    /// Distinct tags across the collection, in first-seen order.
    pub fn tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.notes
            .iter()
            .flat_map(|n| n.tags.iter())
            .filter(|t| seen.insert(*t))
            .cloned()
            .collect()
    }

    /// Flushes the whole collection under the scope key.
    pub fn persist(&self) {
        let key = self.scope.storage_key();
        let result =
            encode_collection(&self.notes).and_then(|json| self.storage.set(&key, &json));

        match result {
            Ok(()) => trace!("Persisted {} notes under {}", self.notes.len(), key),
            Err(e) => {
                self.diagnostics
                    .report(Diagnostic::new(DiagnosticSource::StorageWrite, &e));
            }
        }
    }

    fn unique_id(&self) -> String {
        loop {
            let id = generate_id();
            if self.get(&id).is_none() {
                return id;
            }
            warn!("Generated id {} collides, retrying", id);
        }
    }
}

/// Timestamp for an update: `now`, unless the clock has not moved past the
/// previous stamp, in which case one millisecond after it.
fn next_update_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Loads the collection persisted for `scope`, or an empty one.
fn load_collection(
    storage: &dyn KeyValueStore,
    scope: &Scope,
    diagnostics: &SharedSink,
) -> Vec<Note> {
    let key = scope.storage_key();
    match read_collection(storage, &key) {
        Ok(notes) => {
            debug!("Loaded {} notes from {}", notes.len(), key);
            notes
        }
        Err(e) => {
            diagnostics.report(Diagnostic::new(DiagnosticSource::StorageRead, &e));
            Vec::new()
        }
    }
}

fn read_collection(storage: &dyn KeyValueStore, key: &str) -> Result<Vec<Note>> {
    match storage.get(key)? {
        Some(raw) => decode_collection(&raw),
        None => Ok(Vec::new()),
    }
}

/// Parses a persisted collection.
pub fn decode_collection(raw: &str) -> Result<Vec<Note>> {
    Ok(serde_json::from_str(raw)?)
}

/// Serializes a collection in its persisted form.
pub fn encode_collection(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string(notes)?)
}
