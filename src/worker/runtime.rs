//! Per-worker runtime.
//!
//! # Responsibilities
//! - Serve the worker's own listener on its derived port
//! - Receive frames from the parent link, reconstruct requests, invoke the
//!   handler, and answer the frame's reply channel
//! - Honor the restart directive: stop accepting, drain in-flight
//!   responses, terminate
//!
//! # Design Decisions
//! - Both ingress paths (parent link and own listener) run through the same
//!   handler instance, so state observed directly on the worker's port
//!   reflects dispatched traffic too
//! - A malformed payload is logged and dropped; the worker survives. The
//!   frame's reply channel is dropped with it, which the dispatcher turns
//!   into a client-visible error
//! - Requests replayed from an envelope carry no body; only the worker's
//!   own listener sees payload data

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::ipc::{self, envelope, Frame, IpcMessage};
use crate::worker::handler::{Handler, HandlerRequest, HandlerResponse};

/// Upper bound on bodies read from the worker's own listener.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// How a worker left its slot, the exit-code/signal analog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Ran to completion after draining (exit code 0).
    Clean,
    /// The worker task panicked.
    Panicked,
    /// The worker task was forcibly terminated.
    Killed,
}

/// Events a worker (or its exit watcher) emits to the pool supervisor.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The worker asks to be replaced.
    RestartRequested { index: usize, generation: u64 },
    /// The worker terminated, for any reason.
    Exited {
        index: usize,
        generation: u64,
        outcome: ExitOutcome,
    },
}

/// Shared state for one worker instance.
pub struct WorkerContext {
    pub index: usize,
    pub generation: u64,
    handler: Mutex<Box<dyn Handler>>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl WorkerContext {
    /// Run one request through this worker's handler.
    pub async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        let mut handler = self.handler.lock().await;
        handler.handle(request)
    }

    /// Emit the restart signal upward: ask the supervisor for a replacement.
    pub fn request_restart(&self) {
        let _ = self.events.send(WorkerEvent::RestartRequested {
            index: self.index,
            generation: self.generation,
        });
    }
}

/// One worker: an isolated unit owning a handler instance, a listener, and
/// the receiving half of its parent link.
pub struct WorkerRuntime {
    context: Arc<WorkerContext>,
    listener: TcpListener,
    frames: mpsc::UnboundedReceiver<Frame>,
}

impl WorkerRuntime {
    pub fn new(
        index: usize,
        generation: u64,
        listener: TcpListener,
        handler: Box<dyn Handler>,
        frames: mpsc::UnboundedReceiver<Frame>,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Self {
        Self {
            context: Arc::new(WorkerContext {
                index,
                generation,
                handler: Mutex::new(handler),
                events,
            }),
            listener,
            frames,
        }
    }

    /// Serve until the restart directive arrives or the parent link closes.
    pub async fn run(mut self) {
        let index = self.context.index;
        let generation = self.context.generation;

        let app = Router::new()
            .route("/-/restart", post(restart_handler))
            .fallback(direct_handler)
            .with_state(self.context.clone());

        let (close_tx, close_rx) = oneshot::channel::<()>();
        let listener = self.listener;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = close_rx.await;
                })
                .await
            {
                tracing::error!(worker_index = index, error = %e, "Worker listener failed");
            }
        });

        while let Some(frame) = self.frames.recv().await {
            match ipc::decode(&frame.payload) {
                Ok(IpcMessage::Request(envelope)) => {
                    let response = self.context.handle(envelope.into_request()).await;
                    if let Some(reply) = frame.reply {
                        if reply.send(response).is_err() {
                            tracing::debug!(
                                worker_index = index,
                                "Dispatcher gave up before the response was ready"
                            );
                        }
                    }
                }
                Ok(IpcMessage::Restart) => {
                    tracing::info!(
                        worker_id = generation,
                        worker_index = index,
                        "Restart directive received, draining"
                    );
                    break;
                }
                Err(e) => {
                    // Dropped, not fatal; the originating dispatch already
                    // detached from this worker's perspective.
                    tracing::warn!(
                        worker_id = generation,
                        worker_index = index,
                        error = %e,
                        "Dropping malformed frame"
                    );
                }
            }
        }

        // Stop accepting, flush in-flight responses, then terminate.
        let _ = close_tx.send(());
        let _ = server.await;
        tracing::info!(
            worker_id = generation,
            worker_index = index,
            "Worker stopped"
        );
    }
}

/// Control endpoint on the worker's own port: the worker emits the restart
/// signal upward and keeps serving until the directive comes back down.
async fn restart_handler(State(context): State<Arc<WorkerContext>>) -> StatusCode {
    tracing::info!(
        worker_id = context.generation,
        worker_index = context.index,
        "Worker requesting its own replacement"
    );
    context.request_restart();
    StatusCode::ACCEPTED
}

/// Handler for connections accepted on the worker's own listener.
async fn direct_handler(
    State(context): State<Arc<WorkerContext>>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();
    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let headers = envelope::header_mapping(&parts.headers);

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let request = HandlerRequest {
        method: parts.method.as_str().to_string(),
        url,
        headers,
        body,
    };

    context.handle(request).await.into_response()
}
