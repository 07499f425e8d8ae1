//! The note list synchronizer.
//!
//! A [`NoteListSynchronizer`] owns a [`NoteCollection`] and a [`Draft`] and keeps the collection
//! in step with a [`NoteService`]:
//!
//! - [`activate`](NoteListSynchronizer::activate) opens one subscription per push channel, loads
//!   the whole remote collection, and starts one listener task per channel.
//! - Create and update results are never applied from the mutation's own response. They reach the
//!   collection through the push channels only.
//! - Listener tasks hold the shared state handle, not a copy of the collection, and apply each
//!   event to the collection as it is at delivery time.
use crate::collection::NoteCollection;
use crate::draft::{Draft, SubmitRoute};
use crate::errors::{NoteServiceError, SyncError};
use crate::event::Channel;
use crate::note::{Note, NoteID};
use crate::noteservice::{BoxedNoteService, NoteEventStream};
use crate::options::{DeletePolicy, SyncOptions, UpdatePolicy};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct SyncState {
    draft: Draft,
    notes: NoteCollection,
}

/// State shared between the synchronizer and its listener tasks.
struct Shared {
    state: Mutex<SyncState>,
    snapshots: watch::Sender<Vec<Note>>,
}

impl Shared {
    fn publish(&self, notes: &NoteCollection) {
        self.snapshots.send_replace(notes.as_slice().to_vec());
    }
}

/// One open stream per push channel, and the notes loaded after opening them.
type Connection = (Vec<(Channel, NoteEventStream)>, Vec<Note>);

/// What a successful submit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service created this note; it shows up once the creation notification arrives.
    Created(Note),
    /// The service updated this note; it changes once the update notification arrives.
    Updated(Note),
    /// The edited note was already gone remotely and has been dropped locally.
    Dropped(NoteID),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(NoteID),
    /// The note was already gone remotely and has been dropped locally.
    Dropped(NoteID),
}

pub struct NoteListSynchronizer {
    service: BoxedNoteService,
    options: SyncOptions,
    shared: Arc<Shared>,
    listeners: Vec<JoinHandle<()>>,
}

impl NoteListSynchronizer {
    pub fn new(service: BoxedNoteService, options: SyncOptions) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        NoteListSynchronizer {
            service,
            options,
            shared: Arc::new(Shared {
                state: Mutex::new(SyncState::default()),
                snapshots,
            }),
            listeners: Vec::new(),
        }
    }

    /// Whether every listener is still running.
    ///
    /// A listener stops when its push stream fails, and the synchronizer then counts as inactive
    /// until [`activate`](Self::activate) is called again.
    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty() && self.listeners.iter().all(|h| !h.is_finished())
    }

    /// Load the remote collection and start listening for changes.
    ///
    /// Subscriptions are opened before the load, so changes racing with the load are queued
    /// and replayed on top of it. Replaying a change the load already reflects is harmless.
    /// Subscribing and loading are retried together under the load retry policy.
    ///
    /// Calling this on an active synchronizer does nothing. If a push stream has failed, the
    /// remaining listeners are stopped and everything is subscribed and loaded again. After an
    /// error the synchronizer stays inactive and keeps its previous notes, and `activate` can be
    /// called again.
    pub async fn activate(&mut self) -> Result<(), SyncError> {
        if self.is_active() {
            return Ok(());
        }
        if !self.listeners.is_empty() {
            info!("push channel stopped, reconnecting");
            self.deactivate();
        }
        let (streams, notes) = self.connect_with_retry().await?;
        {
            let mut state = self.shared.state.lock().await;
            state.notes.replace_all(notes);
            info!(count = state.notes.len(), "loaded notes");
            self.shared.publish(&state.notes);
        }
        let policy = self.options.update_policy;
        for (channel, stream) in streams {
            let shared = self.shared.clone();
            self.listeners
                .push(tokio::spawn(listen(channel, stream, shared, policy)));
        }
        Ok(())
    }

    /// Subscribe to every channel, then load the notes.
    async fn connect(&self) -> Result<Connection, NoteServiceError> {
        let mut streams = Vec::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            streams.push((channel, self.service.subscribe(channel).await?));
        }
        let notes = self.service.list_notes().await?;
        Ok((streams, notes))
    }

    async fn connect_with_retry(&self) -> Result<Connection, SyncError> {
        let retry = &self.options.load_retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.connect().await {
                Ok(connected) => return Ok(connected),
                Err(e) if e.is_retryable() && attempt < retry.max_attempts => {
                    let backoff = retry.backoff(attempt);
                    warn!(attempt, ?backoff, error = %e, "loading notes failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(SyncError::LoadFailed {
                        attempts: attempt,
                        source: e,
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Stop every listener. The notes and the draft are kept.
    pub fn deactivate(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
    }

    /// Receive a fresh copy of the notes whenever they change.
    pub fn watch_notes(&self) -> watch::Receiver<Vec<Note>> {
        self.shared.snapshots.subscribe()
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.shared.state.lock().await.notes.as_slice().to_vec()
    }

    pub async fn draft(&self) -> Draft {
        self.shared.state.lock().await.draft.clone()
    }

    pub async fn set_draft_text(&self, text: impl Into<String>) {
        self.shared.state.lock().await.draft.text = text.into();
    }

    /// Start editing `note`. No remote call is made.
    pub async fn select_for_edit(&self, note: &Note) {
        self.shared.state.lock().await.draft = Draft::for_note(note);
    }

    /// Label of the submit control for the current draft.
    pub async fn submit_label(&self) -> &'static str {
        let state = self.shared.state.lock().await;
        state.draft.submit_label(&state.notes)
    }

    /// Send the draft to the service.
    ///
    /// A draft whose ID is still in the collection updates that note; anything else creates a new
    /// one.
    ///
    /// On success the whole draft is cleared, on both paths, but only if it is unchanged since it
    /// was sent. Text typed or a note selected while the request was in flight is kept. This
    /// differs from clearing unconditionally, and from clearing only the text after a create.
    pub async fn submit(&self) -> Result<SubmitOutcome, SyncError> {
        let (submitted, route) = {
            let state = self.shared.state.lock().await;
            if state.draft.is_blank() {
                return Err(SyncError::EmptyDraft);
            }
            (state.draft.clone(), state.draft.route(&state.notes))
        };
        let outcome = match route {
            SubmitRoute::Create(new_note) => {
                debug!("creating note");
                SubmitOutcome::Created(self.service.create_note(new_note).await?)
            }
            SubmitRoute::Update(note) => {
                debug!(id = %note.id, "updating note");
                let id = note.id.clone();
                match self.service.update_note(note).await {
                    Ok(note) => SubmitOutcome::Updated(note),
                    Err(NoteServiceError::NotFound(_)) => {
                        self.drop_vanished(&id).await;
                        SubmitOutcome::Dropped(id)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        let mut state = self.shared.state.lock().await;
        if state.draft == submitted {
            state.draft.clear();
        }
        Ok(outcome)
    }

    /// Delete the note with `id` from the service.
    ///
    /// Under [`DeletePolicy::FilterLocally`] the note leaves the collection as soon as the
    /// service acknowledges; otherwise the deletion notification removes it.
    pub async fn delete(&self, id: &NoteID) -> Result<DeleteOutcome, SyncError> {
        debug!(%id, "deleting note");
        let outcome = match self.service.delete_note(id).await {
            Ok(deleted) => {
                if self.options.delete_policy == DeletePolicy::FilterLocally {
                    let mut state = self.shared.state.lock().await;
                    if state.notes.remove(&deleted.id).is_some() {
                        self.shared.publish(&state.notes);
                    }
                }
                DeleteOutcome::Deleted(deleted.id)
            }
            Err(NoteServiceError::NotFound(_)) => {
                self.drop_vanished(id).await;
                DeleteOutcome::Dropped(id.clone())
            }
            Err(e) => return Err(e.into()),
        };
        self.shared.state.lock().await.draft.clear();
        Ok(outcome)
    }

    async fn drop_vanished(&self, id: &NoteID) {
        let mut state = self.shared.state.lock().await;
        if state.notes.remove(id).is_some() {
            info!(%id, "note vanished remotely, dropped locally");
            self.shared.publish(&state.notes);
        }
    }
}

impl Drop for NoteListSynchronizer {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Apply every event of one push channel until the stream ends or the task is aborted.
async fn listen(
    channel: Channel,
    mut stream: NoteEventStream,
    shared: Arc<Shared>,
    policy: UpdatePolicy,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                let id = event.id().clone();
                let mut state = shared.state.lock().await;
                if state.notes.apply(event, policy) {
                    debug!(%channel, %id, "applied note event");
                    shared.publish(&state.notes);
                } else {
                    debug!(%channel, %id, "note event changed nothing");
                }
            }
            Err(NoteServiceError::Lagged(skipped)) => {
                warn!(%channel, skipped, "push channel lagged, notes may be stale");
            }
            Err(e) => {
                error!(%channel, error = %e, "push channel failed");
                break;
            }
        }
    }
    debug!(%channel, "listener stopped");
}
