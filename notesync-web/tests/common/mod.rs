use lazy_static::lazy_static;
use notesync::InMemoryService;
use notesync_web::configuration::CONFIGURATION;
use notesync_web::startup::run;
use notesync_web::telemetry::{get_subscriber, init_tracing};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

lazy_static! {
    static ref TRACING: () = {
        let subscriber = get_subscriber(&CONFIGURATION)
            .with(tracing_subscriber::fmt::Layer::default().with_test_writer());
        init_tracing(subscriber);
    };
}

pub struct TestApp {
    pub address: String,
    pub service: Arc<InMemoryService>,
}

impl TestApp {
    pub fn api(&self) -> String {
        format!("{}/api/v1", self.address)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_token(None).await
}

pub async fn spawn_app_with_token(token: Option<&str>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // We retrieve the port assigned to us by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    lazy_static::initialize(&TRACING);

    let service = Arc::new(InMemoryService::new());
    let server = run(listener, service.clone(), token.map(str::to_owned))
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);
    TestApp { address, service }
}
