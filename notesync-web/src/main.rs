use notesync_web::configuration::CONFIGURATION;
use notesync_web::startup::run;
use notesync_web::telemetry::{get_otlp_tracer, get_subscriber, init_tracing};
use std::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let otlp_layer =
        get_otlp_tracer(&CONFIGURATION).map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
    let subscriber = get_subscriber(&CONFIGURATION)
        .with(otlp_layer)
        .with(tracing_subscriber::fmt::layer());
    init_tracing(subscriber);

    let address = format!("{}:{}", CONFIGURATION.host, CONFIGURATION.port);
    let listener = TcpListener::bind(&address)?;
    let note_service = CONFIGURATION
        .get_note_service()
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!(%address, "serving notes");
    run(listener, note_service, CONFIGURATION.apitoken.clone())?.await
}
