//! Request envelope: the serialized subset of a request that crosses the
//! dispatch boundary.
//!
//! # Design Decisions
//! - Only method, url (path + query) and headers are carried; the body is
//!   not part of the envelope, so payloads arriving at the front door are
//!   not relayed to the worker (documented limitation)
//! - Header values are lists to preserve repeated headers
//! - Non-UTF-8 header values cannot be represented in the textual wire
//!   format and are skipped

use std::collections::HashMap;

use axum::http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};

use crate::worker::handler::HandlerRequest;

/// Serializable snapshot of an inbound request, sufficient to replay it in
/// a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// HTTP verb string.
    pub method: String,
    /// Path plus query string.
    pub url: String,
    /// String-keyed string-list header mapping.
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
}

impl RequestEnvelope {
    /// Build an envelope from the parts of an accepted request.
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            method: method.as_str().to_string(),
            url,
            headers: header_mapping(headers),
        }
    }

    /// Reconstruct a handler request from this envelope. The body is absent.
    pub fn into_request(self) -> HandlerRequest {
        HandlerRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: None,
        }
    }
}

/// Convert a header map into the envelope's string-list mapping.
pub fn header_mapping(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut mapping: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        match value.to_str() {
            Ok(v) => mapping
                .entry(name.as_str().to_string())
                .or_default()
                .push(v.to_string()),
            Err(_) => {
                tracing::trace!(header = %name, "Skipping non-UTF-8 header value");
            }
        }
    }
    mapping
}
