//! skuzzy - a persistent IRC bot core with pluggable feature workers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use skuzzy::config::{self, ServerConfig};
use skuzzy::control::{ControlServer, ControlState, NoReminders};
use skuzzy::dispatch::Dispatcher;
use skuzzy::features::{FeatureQueues, LoggingHandler, WorkerHost};
use skuzzy::network::{ConnectionRegistry, Outbound, Supervisor};
use skuzzy::telemetry::{self, spans};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

#[derive(Debug, Parser)]
#[command(name = "skuzzy", version, about)]
struct Cli {
    /// One TOML file per server.
    #[arg(required = true)]
    configs: Vec<PathBuf>,

    /// Unix socket for the operator control interface.
    #[arg(long)]
    control_socket: Option<PathBuf>,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Capacity of each feature queue.
    #[arg(long, default_value_t = 64)]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_file.as_deref())?;

    let configs = config::load_all(&cli.configs).context("failed to load config")?;
    if let Err(errors) = config::validate_all(&configs) {
        for e in &errors {
            error!(error = %e, "invalid config");
        }
        anyhow::bail!("{} configuration error(s)", errors.len());
    }
    let configs: Vec<Arc<ServerConfig>> = configs.into_iter().map(Arc::new).collect();
    info!(servers = configs.len(), "starting skuzzy");

    let registry = Arc::new(ConnectionRegistry::new());
    let shutdown = CancellationToken::new();
    let control = Arc::new(ControlState::new());

    let pacing: HashMap<String, _> = configs
        .iter()
        .map(|c| (c.name.clone(), c.timing.pacing()))
        .collect();
    let outbound = Outbound::new(Arc::clone(&registry), config::TimingConfig::default().pacing())
        .with_pacing(pacing);

    let (queues, receivers) = FeatureQueues::new(cli.queue_capacity);
    let mut host = WorkerHost::new(outbound.clone(), shutdown.clone());
    for (kind, rx) in receivers.into_pairs() {
        host.spawn(kind, Arc::new(LoggingHandler), rx);
    }

    let mut supervisors = Vec::with_capacity(configs.len());
    for config in &configs {
        let dispatcher = Dispatcher::new(Arc::clone(config), queues.clone())
            .context("failed to build message classifier")?
            .with_control(Arc::clone(&control));
        let supervisor = Supervisor::new(
            Arc::clone(config),
            Arc::clone(&registry),
            dispatcher,
            shutdown.clone(),
        );
        supervisors.push(tokio::spawn(
            supervisor.run().instrument(spans::server(&config.name)),
        ));
    }
    drop(queues);

    let control_task = match &cli.control_socket {
        Some(path) => {
            let listener = ControlServer::bind(path)
                .with_context(|| format!("failed to bind control socket {}", path.display()))?;
            let server = Arc::new(ControlServer::new(
                Arc::clone(&control),
                outbound.clone(),
                Arc::new(NoReminders),
                configs.iter().map(|c| c.name.clone()).collect(),
                shutdown.clone(),
            ));
            Some(tokio::spawn(server.run(listener)))
        }
        None => None,
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("interrupt received");
        }
        _ = shutdown.cancelled() => {}
    }

    info!("shutting down");
    shutdown.cancel();
    let closed = registry.close_all();
    info!(connections = closed, "closed connections");

    for task in supervisors {
        if let Err(e) = task.await {
            error!(error = %e, "supervisor task failed");
        }
    }
    let panicked = host.join().await;
    if panicked > 0 {
        warn!(panicked, "feature events lost to panics");
    }
    if let Some(task) = control_task {
        if let Err(e) = task.await {
            error!(error = %e, "control task failed");
        }
    }
    if let Some(path) = &cli.control_socket
        && let Err(e) = std::fs::remove_file(path)
    {
        warn!(error = %e, path = %path.display(), "failed to remove control socket");
    }

    info!("shutdown complete");
    Ok(())
}
