//! The front door: accept, envelope, fan out.
//!
//! # Responsibilities
//! - Bind the single externally visible listening socket
//! - Serialize each accepted request into an envelope
//! - Select the next worker in pool order and forward the frame
//! - Relay the worker's response back on the accepted connection
//!
//! # Design Decisions
//! - Selection is blind round robin: the cursor advances unconditionally,
//!   with no liveness check and no backpressure
//! - The request body is not part of the envelope, so payload data never
//!   reaches the worker on this path (documented limitation)
//! - Error surface: send failure to a dead slot → 503; the worker dropping
//!   the reply (malformed envelope, death mid-flight) → 502. Best-effort,
//!   never retried
//! - No per-request timeout

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::dispatch::cursor::DispatchCursor;
use crate::ipc::{self, Frame, RequestEnvelope};
use crate::observability::metrics;
use crate::pool::WorkerPool;

/// State injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
    pub cursor: Arc<DispatchCursor>,
}

/// The round-robin dispatcher owning the front-door socket.
pub struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        let state = AppState {
            pool,
            cursor: Arc::new(DispatchCursor::new()),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Dispatcher listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Dispatcher stopped");
        Ok(())
    }
}

/// Per-request dispatch: envelope, select, forward, relay.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();

    let mut request = request;
    let request_id = ensure_request_id(&mut request);

    let method = request.method().to_string();
    let envelope = RequestEnvelope::from_parts(request.method(), request.uri(), request.headers());

    if request_carries_body(request.headers()) {
        // Known limitation: the envelope carries no body field.
        tracing::debug!(
            request_id = %request_id,
            "Request body is not forwarded across the dispatch channel"
        );
    }

    let payload = match ipc::encode_envelope(&envelope) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to encode envelope");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode request")
                .into_response();
        }
    };

    // Blind round robin: advance regardless of the target's liveness.
    let index = state.cursor.advance(state.pool.len());
    let slot = state.pool.slot(index);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        url = %envelope.url,
        worker_index = index,
        "Dispatching request"
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    let sent = match slot.link() {
        Some(link) => link.frames.send(Frame::request(payload, reply_tx)).is_ok(),
        None => false,
    };

    if !sent {
        // The worker behind this slot is gone; best-effort, no retry.
        tracing::warn!(
            request_id = %request_id,
            worker_index = index,
            "Dispatch target unavailable"
        );
        metrics::record_dispatch(index, 503, start);
        return (StatusCode::SERVICE_UNAVAILABLE, "Worker unavailable").into_response();
    }

    match reply_rx.await {
        Ok(response) => {
            metrics::record_dispatch(index, response.status, start);
            response.into_response()
        }
        Err(_) => {
            // The worker dropped the reply: malformed envelope or death
            // while the dispatch was in flight.
            tracing::warn!(
                request_id = %request_id,
                worker_index = index,
                "Worker did not answer the dispatch"
            );
            metrics::record_dispatch(index, 502, start);
            (StatusCode::BAD_GATEWAY, "Worker did not answer").into_response()
        }
    }
}

/// Whether the request carries a payload the envelope will drop: a positive
/// content-length, or a transfer-encoding (chunked bodies declare no
/// length).
fn request_carries_body(headers: &HeaderMap) -> bool {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0);
    declared || headers.contains_key(header::TRANSFER_ENCODING)
}

/// Make sure an x-request-id header is present and return its value.
fn ensure_request_id(request: &mut Request<Body>) -> String {
    if let Some(id) = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        return id.to_string();
    }
    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert("x-request-id", value);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                name.parse::<axum::http::HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_body_detected_by_content_length() {
        assert!(request_carries_body(&headers(&[("content-length", "42")])));
        assert!(!request_carries_body(&headers(&[("content-length", "0")])));
        assert!(!request_carries_body(&headers(&[])));
    }

    #[test]
    fn test_body_detected_by_chunked_transfer() {
        let map = headers(&[("transfer-encoding", "chunked")]);
        assert!(request_carries_body(&map));
    }
}
