use crate::auth::ApiToken;
use actix_web::http::header;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use futures::{stream, StreamExt};
use notesync::errors::NoteServiceError;
use notesync::sse::{encode_comment, encode_frame, LAGGED_EVENT};
use notesync::{BoxedNoteService, Channel, NewNote, Note, NoteID};
use serde::Deserialize;
use std::convert::Infallible;

fn noteservice_error_handler(e: &NoteServiceError) -> HttpResponse {
    match e {
        NoteServiceError::NotFound(_) => HttpResponse::NotFound().body(e.to_string()),
        NoteServiceError::InvalidRequest(_) => HttpResponse::BadRequest().body(e.to_string()),
        NoteServiceError::SerdeError(_) => HttpResponse::BadRequest().body(e.to_string()),
        NoteServiceError::Unauthenticated => HttpResponse::Unauthorized().finish(),
        NoteServiceError::RemoteUnavailable(_) => {
            error!("Note service unavailable {:?}", e);
            HttpResponse::ServiceUnavailable().finish()
        }
        NoteServiceError::Lagged(_)
        | NoteServiceError::MalformedResponse(_)
        | NoteServiceError::IOError(_) => {
            error!("Note service internal error {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Reject the request unless it carries the configured token.
fn authorize(req: &HttpRequest, token: &ApiToken) -> Result<(), HttpResponse> {
    if token.permits(req) {
        Ok(())
    } else {
        warn!("Rejected unauthenticated request");
        Err(noteservice_error_handler(&NoteServiceError::Unauthenticated))
    }
}

#[derive(Deserialize)]
struct NotePostData {
    text: String,
}

#[get("/note")]
#[instrument(skip(req, token, service))]
async fn list_notes(
    req: HttpRequest,
    token: web::Data<ApiToken>,
    service: web::Data<BoxedNoteService>,
) -> impl Responder {
    if let Err(response) = authorize(&req, &token) {
        return response;
    }
    match service.list_notes().await {
        Ok(notes) => HttpResponse::Ok().json(notes),
        Err(e) => noteservice_error_handler(&e),
    }
}

#[post("/note")]
#[instrument(skip(req, token, service, note))]
async fn new_note(
    req: HttpRequest,
    token: web::Data<ApiToken>,
    service: web::Data<BoxedNoteService>,
    note: web::Json<NotePostData>,
) -> impl Responder {
    if let Err(response) = authorize(&req, &token) {
        return response;
    }
    let NotePostData { text } = note.into_inner();
    match service.create_note(NewNote { text }).await {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(e) => noteservice_error_handler(&e),
    }
}

#[post("/note/{note_id}")]
#[instrument(
    skip(req, token, service, params, note),
    fields(
        note_id = %params.0
    )
)]
async fn update_note(
    req: HttpRequest,
    token: web::Data<ApiToken>,
    service: web::Data<BoxedNoteService>,
    params: web::Path<(String,)>,
    note: web::Json<NotePostData>,
) -> impl Responder {
    if let Err(response) = authorize(&req, &token) {
        return response;
    }
    let (note_id,) = params.into_inner();
    let NotePostData { text } = note.into_inner();
    match service.update_note(Note::new(note_id, text)).await {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(e) => noteservice_error_handler(&e),
    }
}

#[delete("/note/{note_id}")]
#[instrument(
    skip(req, token, service, params),
    fields(
        note_id = %params.0
    )
)]
async fn delete_note(
    req: HttpRequest,
    token: web::Data<ApiToken>,
    service: web::Data<BoxedNoteService>,
    params: web::Path<(String,)>,
) -> impl Responder {
    if let Err(response) = authorize(&req, &token) {
        return response;
    }
    let (note_id,) = params.into_inner();
    let id = NoteID::from(note_id);
    match service.delete_note(&id).await {
        Ok(deleted) => HttpResponse::Ok().json(deleted),
        Err(e) => noteservice_error_handler(&e),
    }
}

/// Stream one push channel as server-sent events.
///
/// Each notification is an `event: <channel>` frame whose data is the JSON payload. A slow
/// subscriber gets a `lagged` frame carrying the number of skipped events.
#[get("/subscribe/{channel}")]
#[instrument(
    skip(req, token, service, params),
    fields(
        channel = %params.0
    )
)]
async fn subscribe(
    req: HttpRequest,
    token: web::Data<ApiToken>,
    service: web::Data<BoxedNoteService>,
    params: web::Path<(String,)>,
) -> impl Responder {
    if let Err(response) = authorize(&req, &token) {
        return response;
    }
    let (channel,) = params.into_inner();
    let channel: Channel = match channel.parse() {
        Ok(channel) => channel,
        Err(e) => return HttpResponse::BadRequest().body(e),
    };
    let events = match service.subscribe(channel).await {
        Ok(events) => events,
        Err(e) => return noteservice_error_handler(&e),
    };
    info!(%channel, "push subscriber connected");
    let frames = events.map(move |item| {
        let frame = match item {
            Ok(event) => match event.to_payload() {
                Ok(payload) => encode_frame(channel.as_str(), &payload),
                Err(e) => {
                    error!(%channel, "Failed to encode note event {:?}", e);
                    encode_comment("dropped malformed event")
                }
            },
            Err(NoteServiceError::Lagged(skipped)) => {
                warn!(%channel, skipped, "push subscriber lagged");
                encode_frame(LAGGED_EVENT, &skipped.to_string())
            }
            Err(e) => {
                warn!(%channel, "push channel error {:?}", e);
                encode_comment("channel error")
            }
        };
        Ok::<_, Infallible>(web::Bytes::from(frame))
    });
    let opening = stream::once(async move {
        Ok::<_, Infallible>(web::Bytes::from(encode_comment(&format!(
            "subscribed {}",
            channel
        ))))
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .streaming(opening.chain(frames))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_notes)
        .service(new_note)
        .service(update_note)
        .service(delete_note)
        .service(subscribe);
}
