//! In-memory note service
use crate::errors::NoteServiceError;
use crate::event::{Channel, NoteEvent};
use crate::note::{NewNote, Note, NoteID, NoteRef};
use crate::noteservice::{NoteEventStream, NoteService};
use futures::future::BoxFuture;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};
use uuid::Uuid;

const BACKUP_FILE_NAME: &str = "notesync_in_memory.json";
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// The note collection, in insertion order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct InMemoryServiceInner {
    notes: Vec<Note>,
}

impl InMemoryServiceInner {
    /// Generate a new [`NoteID`].
    ///
    /// We use the UUID V4 scheme.
    fn get_new_noteid(&self) -> NoteID {
        NoteID::new(Uuid::new_v4().hyphenated().to_string())
    }

    fn position(&self, id: &NoteID) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    fn check_text(text: &str) -> Result<(), NoteServiceError> {
        if text.trim().is_empty() {
            Err(NoteServiceError::InvalidRequest(
                "note text must not be blank".to_owned(),
            ))
        } else {
            Ok(())
        }
    }

    fn create_note(&mut self, note: NewNote) -> Result<Note, NoteServiceError> {
        Self::check_text(&note.text)?;
        let id = self.get_new_noteid();
        assert!(self.position(&id).is_none());
        let note = Note { id, text: note.text };
        self.notes.push(note.clone());
        Ok(note)
    }

    fn update_note(&mut self, note: Note) -> Result<Note, NoteServiceError> {
        Self::check_text(&note.text)?;
        let i = self
            .position(&note.id)
            .ok_or_else(|| NoteServiceError::NotFound(note.id.clone()))?;
        self.notes[i] = note.clone();
        Ok(note)
    }

    fn delete_note(&mut self, id: &NoteID) -> Result<NoteRef, NoteServiceError> {
        let i = self
            .position(id)
            .ok_or_else(|| NoteServiceError::NotFound(id.clone()))?;
        Ok(self.notes.remove(i).id.into())
    }

    fn backup<P: AsRef<Path>>(&self, path: P) -> Result<(), NoteServiceError> {
        let p = path.as_ref().join(BACKUP_FILE_NAME);
        let mut f = File::create(p)?;
        f.write_all(&serde_json::to_vec(&self)?)?;
        Ok(())
    }

    fn restore<P: AsRef<Path>>(path: P) -> Result<Self, NoteServiceError> {
        let p = path.as_ref().join(BACKUP_FILE_NAME);
        let contents = fs::read_to_string(p)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Note service holding everything in memory.
///
/// Every successful mutation is announced on the matching push channel. This is what the web
/// frontend serves, and what tests run synchronizers against.
pub struct InMemoryService {
    ims: RwLock<InMemoryServiceInner>,
    events: broadcast::Sender<NoteEvent>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// `capacity` is how many events a subscriber may fall behind before it lags.
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self::from_inner(InMemoryServiceInner::default(), capacity)
    }

    fn from_inner(inner: InMemoryServiceInner, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        InMemoryService {
            ims: RwLock::new(inner),
            events,
        }
    }

    /// Announce `event` to every current subscriber of its channel.
    pub fn publish(&self, event: NoteEvent) {
        let channel = event.channel();
        match self.events.send(event) {
            Ok(receivers) => trace!(%channel, receivers, "published note event"),
            Err(_) => trace!(%channel, "no subscribers for note event"),
        }
    }

    /// Backup the notes to a folder on some filesystem.
    pub async fn backup<P: AsRef<Path>>(&self, path: P) -> Result<(), NoteServiceError> {
        let ims = self.ims.read().await;
        ims.backup(path)
    }

    /// Restore the notes from a folder on some filesystem.
    pub fn restore<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, NoteServiceError> {
        Ok(Self::from_inner(InMemoryServiceInner::restore(path)?, capacity))
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteService for InMemoryService {
    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, NoteServiceError>> {
        Box::pin(async move {
            let ims = self.ims.read().await;
            Ok(ims.notes.clone())
        })
    }

    fn create_note(&self, note: NewNote) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            let mut ims = self.ims.write().await;
            let note = ims.create_note(note)?;
            debug!(id = %note.id, "created note");
            // Publish under the lock so notifications follow mutation order
            self.publish(NoteEvent::Created(note.clone()));
            Ok(note)
        })
    }

    fn update_note(&self, note: Note) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            let mut ims = self.ims.write().await;
            let note = ims.update_note(note)?;
            debug!(id = %note.id, "updated note");
            self.publish(NoteEvent::Updated(note.clone()));
            Ok(note)
        })
    }

    fn delete_note<'a>(
        &'a self,
        id: &'a NoteID,
    ) -> BoxFuture<'a, Result<NoteRef, NoteServiceError>> {
        Box::pin(async move {
            let mut ims = self.ims.write().await;
            let deleted = ims.delete_note(id)?;
            debug!(%id, "deleted note");
            self.publish(NoteEvent::Deleted(deleted.clone()));
            Ok(deleted)
        })
    }

    fn subscribe(
        &self,
        channel: Channel,
    ) -> BoxFuture<'_, Result<NoteEventStream, NoteServiceError>> {
        Box::pin(async move {
            let rx = self.events.subscribe();
            let stream = futures::stream::unfold(rx, move |mut rx| async move {
                loop {
                    match rx.recv().await {
                        Ok(event) if event.channel() == channel => return Some((Ok(event), rx)),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            return Some((Err(NoteServiceError::Lagged(skipped)), rx))
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            });
            Ok(stream.boxed())
        })
    }
}
