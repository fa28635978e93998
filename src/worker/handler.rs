//! The request-handler seam.
//!
//! # Responsibilities
//! - Define the synchronous `handle(request) -> response` contract the
//!   worker runtime invokes
//! - Define the factory used to give every worker its own private instance
//!
//! # Design Decisions
//! - The handler is synchronous and owns its state; all suspension lives in
//!   the runtime around it
//! - One instance per worker: handlers never share or coordinate state, so
//!   two workers observe independent copies of any mutable store
//! - `body` is optional: requests reconstructed from a dispatch envelope
//!   carry no body, requests accepted on the worker's own listener do

use std::collections::HashMap;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// A request descriptor as seen by a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP verb, e.g. "GET".
    pub method: String,
    /// Path plus query string, e.g. "/api/users?page=2".
    pub url: String,
    /// Header mapping; values are lists to preserve repeated headers.
    pub headers: HashMap<String, Vec<String>>,
    /// Request body. `None` when the request was replayed from an envelope.
    pub body: Option<Vec<u8>>,
}

/// A response descriptor produced by a handler.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    /// Convenience constructor for plain-text responses.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.into().into_bytes(),
        }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = Response::builder().status(status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Body::from(self.body)) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build response from handler output");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// The external request-processing capability consumed by each worker.
///
/// Implementations own their state (e.g. an in-memory record store). The
/// runtime guarantees a single caller at a time per instance.
pub trait Handler: Send {
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse;
}

/// Builds one handler instance per worker.
pub trait HandlerFactory: Send + Sync + 'static {
    fn build(&self) -> Box<dyn Handler>;
}

impl<F> HandlerFactory for F
where
    F: Fn() -> Box<dyn Handler> + Send + Sync + 'static,
{
    fn build(&self) -> Box<dyn Handler> {
        (self)()
    }
}

/// Minimal handler used by the default binary: echoes the request line.
#[derive(Debug, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse {
        HandlerResponse::text(200, format!("{} {}\n", request.method, request.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_handler() {
        let mut handler = EchoHandler;
        let response = handler.handle(HandlerRequest {
            method: "GET".into(),
            url: "/api/users".into(),
            headers: HashMap::new(),
            body: None,
        });
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"GET /api/users\n");
    }
}
