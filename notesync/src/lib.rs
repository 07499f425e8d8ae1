//! notesync: keep a local list of notes in sync with a remote note service.
pub mod collection;
pub mod draft;
pub mod errors;
pub mod event;
pub mod note;
pub mod noteservice;
pub mod options;
pub mod sse;
pub mod synchronizer;

pub use collection::NoteCollection;
pub use draft::Draft;
pub use event::{Channel, NoteEvent};
pub use note::{NewNote, Note, NoteID, NoteRef};
pub use noteservice::{BoxedNoteService, HttpNoteService, InMemoryService, NoteService};
pub use options::{DeletePolicy, RetryPolicy, SyncOptions, UpdatePolicy};
pub use synchronizer::{DeleteOutcome, NoteListSynchronizer, SubmitOutcome};
