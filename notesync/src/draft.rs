//! The edit buffer for composing or editing one note.
use crate::collection::NoteCollection;
use crate::note::{NewNote, Note, NoteID};

/// Transient (text, optional ID) pair.
///
/// With an ID the draft edits that note in place; without one it composes a new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub id: Option<NoteID>,
}

/// Where a submitted draft goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRoute {
    Create(NewNote),
    Update(Note),
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Draft {
            text: text.into(),
            id: None,
        }
    }

    /// A draft editing `note`.
    pub fn for_note(note: &Note) -> Self {
        Draft {
            text: note.text.clone(),
            id: Some(note.id.clone()),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.id = None;
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Decide between create and update against the collection as it is now.
    ///
    /// An ID that is no longer in `notes` falls back to create.
    pub fn route(&self, notes: &NoteCollection) -> SubmitRoute {
        match &self.id {
            Some(id) if notes.contains(id) => SubmitRoute::Update(Note {
                id: id.clone(),
                text: self.text.clone(),
            }),
            _ => SubmitRoute::Create(NewNote {
                text: self.text.clone(),
            }),
        }
    }

    /// Label of the submit control.
    pub fn submit_label(&self, notes: &NoteCollection) -> &'static str {
        match self.route(notes) {
            SubmitRoute::Create(_) => "Add Note",
            SubmitRoute::Update(_) => "Update Note",
        }
    }
}
