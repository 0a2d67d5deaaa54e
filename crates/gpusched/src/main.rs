use clap::{Parser, ValueEnum};
use gpusched_core::to_yaml;
use gpusched_kube::{init_kube_client, ClusterWatcher, KubeBinder, KubeEventRecorder, WatcherConfig};
use gpusched_scheduler::{Scheduler, SchedulerConfig, WorkloadQueue};
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "gpusched", about = "GPU-memory aware Kubernetes scheduler")]
struct Cli {
    /// YAML configuration file; flags override its values
    #[arg(long, env = "GPUSCHED_CONFIG")]
    config: Option<PathBuf>,
    /// Kubeconfig to use instead of in-cluster or default inference
    #[arg(long)]
    kubeconfig: Option<PathBuf>,
    /// Handle pods whose spec.schedulerName matches this
    #[arg(long, env = "GPUSCHED_SCHEDULER_NAME")]
    scheduler_name: Option<String>,
    /// Extended resource used for capacity and requests
    #[arg(long, env = "GPUSCHED_RESOURCE_NAME")]
    resource_name: Option<String>,
    /// Maximum number of pods waiting for a decision
    #[arg(long, env = "GPUSCHED_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,
    /// Seconds between re-enqueues of pending pods (0 disables)
    #[arg(long, env = "GPUSCHED_RESYNC_INTERVAL_SECS")]
    resync_interval_secs: Option<u64>,
    /// How long to wait for the node and pod caches at startup
    #[arg(long, default_value_t = 60)]
    cache_sync_timeout_secs: u64,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    dump_config: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    let config = resolve_config(&cli)?;

    if cli.dump_config {
        print!("{}", to_yaml(&config)?);
        return Ok(());
    }

    run(
        cli.kubeconfig,
        config,
        Duration::from_secs(cli.cache_sync_timeout_secs),
    )
    .await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// Defaults, then the config file, then flags and environment
fn resolve_config(cli: &Cli) -> miette::Result<SchedulerConfig> {
    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::from_yaml_file(path)?,
        None => SchedulerConfig::default(),
    };

    if let Some(name) = &cli.scheduler_name {
        config.scheduler_name = name.clone();
    }
    if let Some(resource) = &cli.resource_name {
        config.resource_name = resource.clone();
    }
    if let Some(capacity) = cli.queue_capacity {
        config.queue_capacity = capacity;
    }
    if let Some(secs) = cli.resync_interval_secs {
        config.resync_interval_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Connect, sync caches, then run the watcher and the decision loop until
/// ctrl-c or until one of them stops
async fn run(
    kubeconfig: Option<PathBuf>,
    config: SchedulerConfig,
    cache_sync_timeout: Duration,
) -> miette::Result<()> {
    info!(
        scheduler = %config.scheduler_name,
        resource = %config.resource_name,
        queue_capacity = config.queue_capacity,
        "Starting gpusched"
    );

    let client = init_kube_client(kubeconfig).await?;
    let (producer, consumer) = WorkloadQueue::bounded(config.queue_capacity)?;
    let token = CancellationToken::new();

    // 1. Spawn cluster watcher
    let watcher = ClusterWatcher::new(client.clone(), WatcherConfig::from(&config), producer);
    let catalog = watcher.catalog();
    let watcher_handle = spawn_component("Cluster watcher", token.clone(), {
        let token = token.clone();
        async move { watcher.run(token).await }
    });

    // 2. Wait for the caches before making any decision
    info!("Waiting for node and pod caches to sync");
    if let Err(e) = catalog.wait_until_ready(cache_sync_timeout).await {
        token.cancel();
        return Err(e.into());
    }

    // 3. Spawn scheduler
    let scheduler = Scheduler::new(
        &config,
        consumer,
        Arc::new(catalog),
        Arc::new(KubeBinder::new(client.clone())),
        Arc::new(KubeEventRecorder::new(
            client,
            config.scheduler_name.clone(),
        )),
    );
    let scheduler_handle = spawn_component("Scheduler", token.clone(), {
        let token = token.clone();
        async move { scheduler.run(token).await }
    });

    info!("All components started");

    // Wait for shutdown signal
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;
            info!("Shutting down gracefully...");
        }
        _ = token.cancelled() => {
            warn!("A component stopped unexpectedly, shutting down");
        }
    }
    token.cancel();

    // Wait for all tasks to finish with a timeout
    let shutdown_timeout = Duration::from_secs(5);
    if tokio::time::timeout(shutdown_timeout, async {
        let _ = tokio::join!(watcher_handle, scheduler_handle);
    })
    .await
    .is_err()
    {
        warn!("Components did not stop within {:?}", shutdown_timeout);
    }

    info!("Shutdown complete");

    Ok(())
}

/// Run a component on its own task. The token is cancelled once the
/// component returns, fails or panics, so its peers shut down with it.
fn spawn_component<F, E>(name: &'static str, token: CancellationToken, component: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    tokio::spawn(async move {
        let _guard = token.drop_guard();
        if let Err(e) = component.await {
            error!("{} error: {}", name, e);
        }
    })
}
