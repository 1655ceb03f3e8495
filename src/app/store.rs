use time::OffsetDateTime;

use crate::note::{Note, NoteId, NoteRecord, DEFAULT_TITLE};
use crate::search::filter_indices;
use crate::storage::{PersistenceAdapter, NOTES_KEY};

/// Ordered note collection plus the filtered view the list widget shows.
///
/// `filtered` holds positions into `notes`, so the view is always a
/// subsequence of the collection in the same relative order.
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    filtered: Vec<usize>,
    query: String,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        let filtered = (0..notes.len()).collect();
        Self {
            notes,
            filtered,
            query: String::new(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered_notes(&self) -> impl Iterator<Item = &Note> + '_ {
        self.filtered.iter().map(move |&idx| &self.notes[idx])
    }

    pub fn displayed_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn displayed(&self, index: usize) -> Option<&Note> {
        self.filtered.get(index).map(|&idx| &self.notes[idx])
    }

    pub fn displayed_position(&self, id: NoteId) -> Option<usize> {
        self.filtered
            .iter()
            .position(|&idx| self.notes[idx].id() == id)
    }

    /// Inserts a fresh note at the front, reapplies the current query and
    /// persists.
    pub fn add_note(&mut self, now: OffsetDateTime, adapter: &PersistenceAdapter) -> NoteId {
        let note = Note::new(DEFAULT_TITLE, now, "");
        let id = note.id();
        self.notes.insert(0, note);
        self.refilter();
        self.persist(adapter);
        tracing::debug!(count = self.notes.len(), "note added");
        id
    }

    /// Removes a note by identity. The view is reset to the full collection
    /// without reapplying the query.
    pub fn delete_note(&mut self, id: NoteId, adapter: &PersistenceAdapter) -> Option<Note> {
        let position = self.notes.iter().position(|note| note.id() == id)?;
        let removed = self.notes.remove(position);
        self.filtered = (0..self.notes.len()).collect();
        self.persist(adapter);
        tracing::debug!(count = self.notes.len(), "note deleted");
        Some(removed)
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
    }

    pub fn update_title(
        &mut self,
        displayed_index: usize,
        title: &str,
        adapter: &PersistenceAdapter,
    ) -> bool {
        let Some(note) = self.displayed_mut(displayed_index) else {
            return false;
        };
        note.title = title.to_string();
        self.persist(adapter);
        true
    }

    pub fn update_text(
        &mut self,
        displayed_index: usize,
        title: &str,
        text: &str,
        adapter: &PersistenceAdapter,
    ) -> bool {
        let Some(note) = self.displayed_mut(displayed_index) else {
            return false;
        };
        note.title = title.to_string();
        note.text = text.to_string();
        self.persist(adapter);
        true
    }

    /// Full-collection overwrite; there are no partial writes.
    pub fn persist(&self, adapter: &PersistenceAdapter) {
        match self.serialize() {
            Ok(json) => adapter.set(NOTES_KEY, &json),
            Err(err) => tracing::warn!(?err, "failed to serialise note collection"),
        }
    }

    pub fn serialize(&self) -> serde_json::Result<String> {
        let records: Vec<NoteRecord> = self.notes.iter().map(Note::to_record).collect();
        serde_json::to_string(&records)
    }

    fn displayed_mut(&mut self, displayed_index: usize) -> Option<&mut Note> {
        let idx = *self.filtered.get(displayed_index)?;
        self.notes.get_mut(idx)
    }

    fn refilter(&mut self) {
        self.filtered = filter_indices(&self.notes, &self.query);
    }
}

/// Decodes a persisted collection. Anything unreadable yields an empty list.
pub fn decode_notes(raw: &str) -> Vec<Note> {
    let records: Option<Vec<NoteRecord>> = match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(?err, "persisted notes are malformed, starting empty");
            return Vec::new();
        }
    };
    let records = records.unwrap_or_default();
    let total = records.len();
    let notes: Vec<Note> = records.into_iter().filter_map(Note::from_record).collect();
    if notes.len() != total {
        tracing::warn!(
            skipped = total - notes.len(),
            "dropped persisted notes without a usable timestamp"
        );
    }
    notes
}
