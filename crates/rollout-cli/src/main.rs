//! `rollout`: deploy a compose stack and exit 0 only once every container is ready.

mod args;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rollout_core::{ConfigError, Coordinator, HostsFile, Maintenance};
use rollout_exec::{ProcessRunner, SystemRunner};
use rollout_model::DeploymentOutcome;
use rollout_observe::{TracingSink, init_logger};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use args::{Args, Settings};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = init_logger(&args.logger_config()) {
        eprintln!("rollout: {e}");
        std::process::exit(1);
    }

    let code = match run(&args).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!(target: "rollout.cli", "{e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(args: &Args) -> anyhow::Result<DeploymentOutcome> {
    let settings = args.settings().context("invalid configuration")?;
    echo_compose_file(settings.compose_file()).context("invalid configuration")?;

    if let Some(ip) = settings.server_ip {
        HostsFile::new(&settings.hosts_file).ensure_entry(ip)?;
    }

    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner::new());
    let maintenance = Maintenance::new(Arc::clone(&runner), settings.config.cli.clone());
    prune(&maintenance, &settings).await;
    if !settings.skip_pull {
        maintenance.pull().await?;
    }

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            warn!(target: "rollout.cli", "shutdown requested, stopping rollout");
            shutdown.cancel();
        }
    });

    let stack = settings.compose_file().display().to_string();
    let sink = Arc::new(TracingSink::for_stack(stack));
    let outcome = Coordinator::new(runner, sink, settings.config.clone())
        .run_with_cancel(shutdown)
        .await?;

    if outcome.ok {
        prune(&maintenance, &settings).await;
        info!(target: "rollout.cli", "deployment successful");
    } else {
        error!(target: "rollout.cli", reason = %outcome.reason, "deployment failed");
    }
    Ok(outcome)
}

/// Log the stack definition before acting on it.
fn echo_compose_file(path: &Path) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(target: "rollout.cli", "compose file {}:\n{content}", path.display());
    Ok(())
}

/// Pruning is best effort.
async fn prune(maintenance: &Maintenance, settings: &Settings) {
    if settings.skip_prune {
        return;
    }
    if let Err(e) = maintenance.prune().await {
        warn!(target: "rollout.cli", "ignoring prune failure: {e}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(target: "rollout.cli", "failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(target: "rollout.cli", "failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
