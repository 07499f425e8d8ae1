//! Core types of notesync.
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// ID of notes.
///
/// Assigned by the note service when a note is created.
/// Within one note service, a [`NoteID`] identifies at most one note.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Hash)]
#[serde(transparent)]
pub struct NoteID {
    id: String,
}

impl NoteID {
    pub fn new(id: String) -> Self {
        NoteID { id }
    }
}

impl From<String> for NoteID {
    fn from(id: String) -> NoteID {
        NoteID::new(id)
    }
}

impl From<&str> for NoteID {
    fn from(id: &str) -> NoteID {
        NoteID::new(id.to_owned())
    }
}

impl Display for NoteID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl AsRef<str> for NoteID {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

/// A note as the note service returns it.
///
/// Local collections keep their own copies; a [`Note`] is replaced as a whole on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteID,
    pub text: String,
}

impl Note {
    pub fn new(id: impl Into<NoteID>, text: impl Into<String>) -> Self {
        Note {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Input of the create mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub text: String,
}

impl From<&str> for NewNote {
    fn from(text: &str) -> Self {
        NewNote {
            text: text.to_owned(),
        }
    }
}

impl From<String> for NewNote {
    fn from(text: String) -> Self {
        NewNote { text }
    }
}

/// A bare reference to a note.
///
/// Returned by the delete mutation and carried by deletion notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: NoteID,
}

impl From<NoteID> for NoteRef {
    fn from(id: NoteID) -> Self {
        NoteRef { id }
    }
}
