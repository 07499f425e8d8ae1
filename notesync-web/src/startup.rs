use crate::auth::ApiToken;
use crate::routes::*;
use actix_web::dev::Server;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use notesync::BoxedNoteService;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub fn run(
    listener: TcpListener,
    note_service: BoxedNoteService,
    api_token: Option<String>,
) -> Result<Server, std::io::Error> {
    let ns: Data<BoxedNoteService> = Data::new(note_service);
    let token: Data<ApiToken> = Data::new(ApiToken(api_token));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(TracingLogger::default())
            .service(web::scope("/api/v1").configure(api_v1_config))
            .configure(index_config)
            .app_data(ns.clone())
            .app_data(token.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
