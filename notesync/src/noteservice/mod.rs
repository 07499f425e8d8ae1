//! Remote note services.
use crate::errors::NoteServiceError;
use crate::event::{Channel, NoteEvent};
use crate::note::{NewNote, Note, NoteID, NoteRef};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::sync::Arc;

mod http;
mod in_memory;
pub mod util;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpNoteService;
pub use in_memory::InMemoryService;

/// Stream of notifications from one push channel.
///
/// The stream ends when the service closes the channel.
pub type NoteEventStream = BoxStream<'static, Result<NoteEvent, NoteServiceError>>;

pub type BoxedNoteService = Arc<dyn NoteService>;

/// An abstraction for the remote note collection.
///
/// Authentication happens outside this trait: implementations run in an authenticated context
/// and report [`NoteServiceError::Unauthenticated`] when the identity collaborator disagrees.
pub trait NoteService: Send + Sync {
    /// Fetch the whole collection.
    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, NoteServiceError>>;
    /// Create a note.
    ///
    /// The service assigns the [`NoteID`] and announces the note on [`Channel::Created`].
    fn create_note(&self, note: NewNote) -> BoxFuture<'_, Result<Note, NoteServiceError>>;
    /// Replace the text of an existing note.
    ///
    /// Fails with [`NoteServiceError::NotFound`] if the note is gone.
    fn update_note(&self, note: Note) -> BoxFuture<'_, Result<Note, NoteServiceError>>;
    /// Delete a note.
    fn delete_note<'a>(&'a self, id: &'a NoteID)
        -> BoxFuture<'a, Result<NoteRef, NoteServiceError>>;
    /// Open a push channel.
    ///
    /// Once the returned future resolves, every later change on `channel` is delivered to the
    /// stream, at most once per subscription and in no guaranteed order relative to other
    /// channels.
    fn subscribe(&self, channel: Channel)
        -> BoxFuture<'_, Result<NoteEventStream, NoteServiceError>>;
}
