use notesync::noteservice::util::populate_test_data;
use notesync::errors::NoteServiceError;
use notesync::InMemoryService;
use std::sync::Arc;

#[derive(serde::Deserialize, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    populateinmemorystore: bool,
    /// Bearer token required on every API request, if set.
    pub apitoken: Option<String>,
    /// How far a subscriber may fall behind before it skips events.
    pub eventcapacity: usize,
    pub otlpendpoint: Option<String>,
}

impl Settings {
    pub async fn get_note_service(&self) -> Result<Arc<InMemoryService>, NoteServiceError> {
        let service = Arc::new(InMemoryService::with_event_capacity(self.eventcapacity));
        if self.populateinmemorystore {
            populate_test_data(service.as_ref()).await?;
        }
        Ok(service)
    }
}

lazy_static! {
    pub static ref CONFIGURATION: Settings =
        get_configuration().expect("Failed to read configuration.yml.");
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("debug", false)?
        .set_default("host", "localhost")?
        .set_default("port", 8000)?
        .set_default("populateinmemorystore", true)?
        .set_default("eventcapacity", 256)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::default()
                .prefix("notesync")
                .separator("_"),
        )
        .build()?;
    config.try_deserialize()
}
