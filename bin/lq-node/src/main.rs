//! LeaseQueue Node
//!
//! Runs one instance against the shared Redis queue. Instances start as
//! consumers; whichever first finds the generator lease absent becomes the
//! generator. With `--get-errors` the node instead prints and removes every
//! message in the error list, then exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use lq_config::{AppConfig, ConfigLoader};
use lq_store::{RedisStore, Store};
use lq_worker::{ErrorSink, Instance, Role, SimulatedProcessor, StopHandle, WorkerConfig};

/// Redis message queue
#[derive(Parser, Debug)]
#[command(name = "lq-node")]
#[command(about = "Self-electing generator/consumer over a Redis list")]
struct Args {
    /// Collect all errors and exit
    #[arg(short = 'e', long = "get-errors", conflicts_with = "generator")]
    get_errors: bool,

    /// Start as generator instead of consumer
    #[arg(long)]
    generator: bool,

    /// Configuration file path
    #[arg(long, env = "LEASEQUEUE_CONFIG")]
    config: Option<PathBuf>,

    /// Queue name (overrides configuration)
    #[arg(long)]
    queue: Option<String>,

    /// Redis URL (overrides configuration)
    #[arg(long)]
    redis_url: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    if args.example_config {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    lq_common::logging::init_logging("lq-node");

    let config = load_config(&args)?;
    info!(
        redis_url = %config.redis.url,
        queue = %config.queue.name,
        lease_key = %config.lease.key,
        lease_ttl_seconds = config.lease.ttl_seconds,
        "Configuration loaded"
    );

    let store: Arc<dyn Store> = Arc::new(RedisStore::connect(&config.redis.url).await?);

    if args.get_errors {
        let sink = ErrorSink::new(store, config.queue.error_queue());
        let drained = sink.drain(|message| println!("{}", message)).await?;
        info!(drained, "Error collection finished");
        return Ok(());
    }

    let role = if args.generator { Role::Generator } else { Role::Consumer };
    let processor = Arc::new(SimulatedProcessor::new(config.processing.failure_one_in));
    let instance = Instance::new(WorkerConfig::from_app_config(&config), store, processor, role);

    tokio::spawn(shutdown_signal(instance.stop_handle()));
    instance.run().await?;

    info!("LeaseQueue node stopped");
    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    if let Some(queue) = &args.queue {
        config.queue.name = queue.clone();
    }
    if let Some(url) = &args.redis_url {
        config.redis.url = url.clone();
    }
    config.validate()?;

    Ok(config)
}

async fn shutdown_signal(stop: StopHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C handler");
        return;
    }
    info!("Shutdown signal received, stopping after the current step");
    stop.stop();
}
