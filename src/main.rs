use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use cluster_balancer::config::load_config;
use cluster_balancer::lifecycle::Shutdown;
use cluster_balancer::observability::{logging, metrics};
use cluster_balancer::worker::{EchoHandler, Handler};
use cluster_balancer::{Dispatcher, WorkerPool};

#[derive(Debug, Parser)]
#[command(name = "cluster-balancer", about = "Round-robin worker-pool balancer")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        pid = std::process::id(),
        bind_address = %config.bind_address(),
        pool_size = config.pool.size,
        "cluster-balancer starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    // Default handler; real deployments plug in their own via the library.
    let factory = Arc::new(|| Box::new(EchoHandler) as Box<dyn Handler>);

    let (pool, supervisor) = WorkerPool::spawn(&config, factory, shutdown.subscribe()).await?;

    let listener = TcpListener::bind(config.bind_address()).await?;
    let dispatcher = Dispatcher::new(pool);
    dispatcher.run(listener, shutdown.subscribe()).await?;

    // The supervisor resolves once the pool-wide drain has finished; exiting
    // before that would tear the workers down mid-drain.
    let _ = supervisor.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
