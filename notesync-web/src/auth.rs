//! Static bearer token gate standing in for the identity collaborator.
use actix_web::http::header;
use actix_web::HttpRequest;

/// Token every API request must present. `None` lets every request through.
#[derive(Debug, Clone, Default)]
pub struct ApiToken(pub Option<String>);

impl ApiToken {
    pub fn permits(&self, req: &HttpRequest) -> bool {
        let Some(expected) = &self.0 else {
            return true;
        };
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| presented == expected)
    }
}
