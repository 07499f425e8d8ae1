//! A scripted note service for synchronizer tests.
//!
//! It records every request, assigns IDs `n1`, `n2`, ..., and never publishes notifications on
//! its own: tests deliver them with [`MockService::push`]. Subscriptions are not recorded.
use crate::errors::NoteServiceError;
use crate::event::{Channel, NoteEvent};
use crate::note::{NewNote, Note, NoteID, NoteRef};
use crate::noteservice::{NoteEventStream, NoteService};
use crate::InMemoryService;
use futures::future::BoxFuture;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    List,
    Create(NewNote),
    Update(Note),
    Delete(NoteID),
}

pub(crate) struct MockService {
    remote: Mutex<Vec<Note>>,
    requests: Mutex<Vec<Request>>,
    failures: Mutex<VecDeque<NoteServiceError>>,
    subscribe_failures: Mutex<VecDeque<NoteServiceError>>,
    next_id: Mutex<u32>,
    bus: InMemoryService,
    breaks: broadcast::Sender<()>,
    /// Held by a test to keep creations from completing.
    pub(crate) hold: tokio::sync::Mutex<()>,
}

impl Default for MockService {
    fn default() -> Self {
        MockService {
            remote: Default::default(),
            requests: Default::default(),
            failures: Default::default(),
            subscribe_failures: Default::default(),
            next_id: Default::default(),
            bus: Default::default(),
            breaks: broadcast::channel(1).0,
            hold: Default::default(),
        }
    }
}

impl MockService {
    pub(crate) fn with_notes(notes: Vec<Note>) -> Self {
        MockService {
            remote: Mutex::new(notes),
            ..Default::default()
        }
    }

    /// Make the next subscriptions fail, in order.
    pub(crate) fn fail_next_subscribe(&self, error: NoteServiceError) {
        self.subscribe_failures.lock().unwrap().push_back(error);
    }

    /// Fail every open push stream with `RemoteUnavailable`.
    pub(crate) fn break_streams(&self) {
        let _ = self.breaks.send(());
    }

    /// Make the next calls fail, in order.
    pub(crate) fn fail_next(&self, error: NoteServiceError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn push(&self, event: NoteEvent) {
        self.bus.publish(event);
    }

    fn record(&self, request: Request) -> Result<(), NoteServiceError> {
        self.requests.lock().unwrap().push(request);
        match self.failures.lock().unwrap().pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl NoteService for MockService {
    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, NoteServiceError>> {
        Box::pin(async move {
            self.record(Request::List)?;
            Ok(self.remote.lock().unwrap().clone())
        })
    }

    fn create_note(&self, note: NewNote) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            self.record(Request::Create(note.clone()))?;
            let _hold = self.hold.lock().await;
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let note = Note::new(format!("n{}", next_id), note.text);
            self.remote.lock().unwrap().push(note.clone());
            Ok(note)
        })
    }

    fn update_note(&self, note: Note) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            self.record(Request::Update(note.clone()))?;
            Ok(note)
        })
    }

    fn delete_note<'a>(
        &'a self,
        id: &'a NoteID,
    ) -> BoxFuture<'a, Result<NoteRef, NoteServiceError>> {
        Box::pin(async move {
            self.record(Request::Delete(id.clone()))?;
            self.remote.lock().unwrap().retain(|note| &note.id != id);
            Ok(id.clone().into())
        })
    }

    fn subscribe(
        &self,
        channel: Channel,
    ) -> BoxFuture<'_, Result<NoteEventStream, NoteServiceError>> {
        Box::pin(async move {
            let failure = self.subscribe_failures.lock().unwrap().pop_front();
            if let Some(e) = failure {
                return Err(e);
            }
            let events = self.bus.subscribe(channel).await?;
            let breaks = futures::stream::unfold(self.breaks.subscribe(), |mut rx| async move {
                rx.recv().await.ok().map(|()| {
                    let e = NoteServiceError::RemoteUnavailable("stream broken".to_owned());
                    (Err::<NoteEvent, _>(e), rx)
                })
            });
            Ok(futures::stream::select(events, breaks).boxed())
        })
    }
}
