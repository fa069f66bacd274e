pub mod handlers;
pub mod jobs;
pub mod routes;
pub mod uploads;

pub use routes::create_router;

use serde::Serialize;

/// Error response body shared by the API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
