//! Note service reached over HTTP.
//!
//! Speaks the JSON API served by `notesync-web` under `/api/v1`. Push channels are server-sent
//! event streams, one long-lived request per channel.
use crate::errors::NoteServiceError;
use crate::event::{Channel, NoteEvent};
use crate::note::{NewNote, Note, NoteID, NoteRef};
use crate::noteservice::{NoteEventStream, NoteService};
use crate::sse::{SseDecoder, SseFrame, LAGGED_EVENT};
use futures::future::BoxFuture;
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::collections::VecDeque;
use tracing::{debug, warn};

pub struct HttpNoteService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpNoteService {
    /// `base_url` is the API root, such as `http://localhost:8000/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpNoteService {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: None,
        }
    }

    /// Send `token` as a bearer token on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Map a response status to the error taxonomy.
///
/// `subject` is the note a 404 refers to, if the request is about one.
async fn check_response(
    response: Response,
    subject: Option<&NoteID>,
) -> Result<Response, NoteServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match (status, subject) {
        (StatusCode::NOT_FOUND, Some(id)) => NoteServiceError::NotFound(id.clone()),
        (StatusCode::UNAUTHORIZED, _) => NoteServiceError::Unauthenticated,
        (StatusCode::BAD_REQUEST, _) => NoteServiceError::InvalidRequest(body),
        (status, _) => NoteServiceError::RemoteUnavailable(format!("{}: {}", status, body)),
    })
}

/// Turn a frame from `channel`'s stream into an event, skipping frames for other events.
fn decode_frame(channel: Channel, frame: SseFrame) -> Option<Result<NoteEvent, NoteServiceError>> {
    match frame.event.as_deref() {
        Some(LAGGED_EVENT) => Some(Err(NoteServiceError::Lagged(
            frame.data.trim().parse().unwrap_or(0),
        ))),
        Some(event) if event == channel.as_str() => {
            Some(NoteEvent::from_payload(channel, &frame.data).map_err(NoteServiceError::from))
        }
        other => {
            debug!(?other, %channel, "skipping frame");
            None
        }
    }
}

impl NoteService for HttpNoteService {
    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, NoteServiceError>> {
        Box::pin(async move {
            let response = self.request(Method::GET, "note").send().await?;
            Ok(check_response(response, None).await?.json().await?)
        })
    }

    fn create_note(&self, note: NewNote) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            let response = self.request(Method::POST, "note").json(&note).send().await?;
            Ok(check_response(response, None).await?.json().await?)
        })
    }

    fn update_note(&self, note: Note) -> BoxFuture<'_, Result<Note, NoteServiceError>> {
        Box::pin(async move {
            let response = self
                .request(Method::POST, &format!("note/{}", note.id))
                .json(&NewNote {
                    text: note.text.clone(),
                })
                .send()
                .await?;
            Ok(check_response(response, Some(&note.id))
                .await?
                .json()
                .await?)
        })
    }

    fn delete_note<'a>(
        &'a self,
        id: &'a NoteID,
    ) -> BoxFuture<'a, Result<NoteRef, NoteServiceError>> {
        Box::pin(async move {
            let response = self
                .request(Method::DELETE, &format!("note/{}", id))
                .send()
                .await?;
            Ok(check_response(response, Some(id)).await?.json().await?)
        })
    }

    fn subscribe(
        &self,
        channel: Channel,
    ) -> BoxFuture<'_, Result<NoteEventStream, NoteServiceError>> {
        Box::pin(async move {
            let response = self
                .request(Method::GET, &format!("subscribe/{}", channel))
                .send()
                .await?;
            let bytes = check_response(response, None).await?.bytes_stream().boxed();
            debug!(%channel, "subscribed");
            let state = (bytes, SseDecoder::new(), VecDeque::new());
            let stream = futures::stream::unfold(
                state,
                move |(mut bytes, mut decoder, mut pending)| async move {
                    loop {
                        while let Some(frame) = pending.pop_front() {
                            if let Some(item) = decode_frame(channel, frame) {
                                return Some((item, (bytes, decoder, pending)));
                            }
                        }
                        match bytes.next().await {
                            Some(Ok(chunk)) => match decoder.push(&chunk) {
                                Ok(frames) => pending.extend(frames),
                                Err(e) => {
                                    warn!(%channel, error = %e, "dropping push stream");
                                    let e = NoteServiceError::MalformedResponse(e.to_string());
                                    return Some((Err(e), (bytes, decoder, pending)));
                                }
                            },
                            Some(Err(e)) => {
                                warn!(%channel, error = %e, "push stream failed");
                                return Some((Err(e.into()), (bytes, decoder, pending)));
                            }
                            None => return None,
                        }
                    }
                },
            );
            Ok(stream.boxed())
        })
    }
}
