//! The `{status, body}` response envelope.
//!
//! Every route answers with this shape, and the HTTP status always equals
//! `status`. Error responses carry a `null` body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body: Some(body),
        }
    }
}

impl Envelope<()> {
    /// Envelope with a status and no body
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            body: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
