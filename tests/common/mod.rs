//! Shared harness for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use cluster_balancer::config::BalancerConfig;
use cluster_balancer::lifecycle::Shutdown;
use cluster_balancer::worker::{Handler, HandlerFactory, HandlerRequest, HandlerResponse};
use cluster_balancer::{Dispatcher, WorkerPool};

/// A running balancer + pool bound to `base_port` (dispatcher) and
/// `base_port + 1 + index` (workers).
pub struct TestCluster {
    pub pool: Arc<WorkerPool>,
    pub shutdown: Shutdown,
    pub base_port: u16,
    /// Resolves once the supervisor has finished the pool-wide drain.
    pub supervisor: tokio::task::JoinHandle<()>,
}

impl TestCluster {
    pub fn balancer_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.base_port, path)
    }

    pub fn worker_url(&self, index: usize, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.base_port + 1 + index as u16, path)
    }
}

/// Start a full cluster on unique ports. Each test uses its own base port.
pub async fn start_cluster(
    base_port: u16,
    size: usize,
    factory: Arc<dyn HandlerFactory>,
) -> TestCluster {
    let mut config = BalancerConfig::default();
    config.listener.bind_host = "127.0.0.1".to_string();
    config.listener.port = base_port;
    config.pool.size = size;
    config.observability.metrics_enabled = false;

    let shutdown = Shutdown::new();

    let (pool, supervisor) = WorkerPool::spawn(&config, factory, shutdown.subscribe())
        .await
        .expect("pool failed to start");

    let listener = TcpListener::bind(config.bind_address())
        .await
        .expect("dispatcher bind failed");
    let dispatcher = Dispatcher::new(pool.clone());
    let dispatcher_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = dispatcher.run(listener, dispatcher_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    TestCluster {
        pool,
        shutdown,
        base_port,
        supervisor,
    }
}

/// Poll until `condition` holds or the deadline expires.
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Handler that tags responses with its instance id, assigned in creation
/// order. Workers are spawned sequentially, so at start-up instance id ==
/// pool index, and replacements get fresh ids.
pub struct TagHandler {
    id: usize,
}

impl Handler for TagHandler {
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse {
        let body = match &request.body {
            Some(bytes) => format!("some({})", bytes.len()),
            None => "none".to_string(),
        };
        HandlerResponse::text(
            200,
            format!(
                "instance={};method={};url={};body={}",
                self.id, request.method, request.url, body
            ),
        )
    }
}

/// Factory producing [`TagHandler`]s with sequential instance ids.
pub fn tag_factory() -> Arc<dyn HandlerFactory> {
    let next = Arc::new(AtomicUsize::new(0));
    Arc::new(move || {
        let id = next.fetch_add(1, Ordering::SeqCst);
        Box::new(TagHandler { id }) as Box<dyn Handler>
    })
}

/// Extract the `instance=` tag from a [`TagHandler`] response body.
pub fn instance_of(body: &str) -> usize {
    body.split(';')
        .find_map(|field| field.strip_prefix("instance="))
        .and_then(|v| v.parse().ok())
        .expect("response body carries no instance tag")
}

/// Handler with a private mutable counter: POST increments, GET reads.
#[derive(Default)]
pub struct CounterHandler {
    count: usize,
}

impl Handler for CounterHandler {
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse {
        if request.method == "POST" {
            self.count += 1;
        }
        HandlerResponse::text(200, self.count.to_string())
    }
}

/// Factory producing independent [`CounterHandler`]s.
pub fn counter_factory() -> Arc<dyn HandlerFactory> {
    Arc::new(|| Box::new(CounterHandler::default()) as Box<dyn Handler>)
}
