//! The local note collection and its reconciliation rules.
//!
//! Three writers touch a [`NoteCollection`]: the initial load, local mutations, and push
//! notifications. Every write goes through the methods here, so the collection never holds two
//! notes with the same [`NoteID`].
use crate::event::NoteEvent;
use crate::note::{Note, NoteID};
use crate::options::UpdatePolicy;

/// Ordered list of notes, unique by ID.
///
/// Order carries no meaning beyond display; no sort is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    notes: Vec<Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replace the whole collection.
    ///
    /// If `notes` repeats an ID, the later copy wins.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes.clear();
        for note in notes {
            self.apply_created(note);
        }
    }

    fn position(&self, id: &NoteID) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    pub fn contains(&self, id: &NoteID) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &NoteID) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    /// Remove any note with the same ID, then append.
    ///
    /// Delivering the same creation twice leaves a single copy.
    pub fn apply_created(&mut self, note: Note) {
        self.remove(&note.id);
        self.notes.push(note);
    }

    /// Replace the note with the same ID in place.
    ///
    /// Returns whether the collection changed.
    pub fn apply_updated(&mut self, note: Note, policy: UpdatePolicy) -> bool {
        match (self.position(&note.id), policy) {
            (Some(i), _) => {
                if self.notes[i] == note {
                    return false;
                }
                self.notes[i] = note;
                true
            }
            (None, UpdatePolicy::DropIfMissing) => false,
            (None, UpdatePolicy::InsertIfMissing) => {
                self.notes.push(note);
                true
            }
        }
    }

    /// Remove the note with `id`; absence is a no-op.
    pub fn remove(&mut self, id: &NoteID) -> Option<Note> {
        self.position(id).map(|i| self.notes.remove(i))
    }

    /// Apply a change notification. Returns whether the collection changed.
    pub fn apply(&mut self, event: NoteEvent, policy: UpdatePolicy) -> bool {
        match event {
            NoteEvent::Created(note) => {
                if self.get(&note.id) == Some(&note) && self.notes.last() == Some(&note) {
                    return false;
                }
                self.apply_created(note);
                true
            }
            NoteEvent::Updated(note) => self.apply_updated(note, policy),
            NoteEvent::Deleted(note_ref) => self.remove(&note_ref.id).is_some(),
        }
    }
}

impl From<Vec<Note>> for NoteCollection {
    fn from(notes: Vec<Note>) -> Self {
        let mut collection = NoteCollection::new();
        collection.replace_all(notes);
        collection
    }
}
