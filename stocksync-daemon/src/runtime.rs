use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use stocksync_core::{SyncConfig, Transport};
use stocksync_sync::{pipeline, CancelToken, RunOptions, RunReport, RunSummary};

use crate::error::{io_err, DaemonError};

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub interval: Duration,
    /// Stop after this many passes. `None` runs until shutdown.
    pub max_cycles: Option<usize>,
    pub dry_run: bool,
}

impl LoopOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
            dry_run: false,
        }
    }
}

/// What the loop did before it stopped.
#[derive(Debug, Clone, Default)]
pub struct LoopReport {
    pub cycles: usize,
    /// Passes that ended in a fatal error (feed, catalog, location).
    pub failed_cycles: usize,
    pub last: Option<RunSummary>,
    pub cancelled: bool,
}

/// Start the loop on a fresh multi-thread runtime and block until it exits.
pub fn start_blocking(
    config: SyncConfig,
    transport: Arc<dyn Transport>,
    options: LoopOptions,
) -> Result<LoopReport, DaemonError> {
    build_runtime()?.block_on(run(Arc::new(config), transport, options))
}

/// Run a single pass on a fresh runtime with Ctrl-C wired to `options.cancel`.
pub fn run_once_blocking(
    config: SyncConfig,
    transport: Arc<dyn Transport>,
    options: RunOptions,
) -> Result<RunReport, DaemonError> {
    build_runtime()?.block_on(run_once(Arc::new(config), transport, options))
}

/// One pass on the blocking pool. Ctrl-C sets the cancel flag: the pass stops
/// before its next update and reports the rest as pending.
pub async fn run_once(
    config: Arc<SyncConfig>,
    transport: Arc<dyn Transport>,
    options: RunOptions,
) -> Result<RunReport, DaemonError> {
    let signal_handle = {
        let cancel = options.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, stopping after the current update");
                cancel.cancel();
            }
        })
    };

    let result = tokio::task::spawn_blocking(move || {
        pipeline::run(&config, transport.as_ref(), &options)
    })
    .await;
    signal_handle.abort();

    let report = result.map_err(|err| DaemonError::Join {
        task: "sync_pass",
        message: err.to_string(),
    })??;
    Ok(report)
}

fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

/// Run the loop with a Ctrl-C handler attached.
///
/// Ctrl-C sets the cancel flag (the in-flight pass stops before its next
/// update) and ends the loop once that pass returns.
pub async fn run(
    config: Arc<SyncConfig>,
    transport: Arc<dyn Transport>,
    options: LoopOptions,
) -> Result<LoopReport, DaemonError> {
    let cancel = CancelToken::new();
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok::<(), DaemonError>(()),
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(DaemonError::Signal)?;
                    tracing::info!("received ctrl-c, stopping after the current update");
                    cancel.cancel();
                    let _ = shutdown.send(());
                    Ok(())
                }
            }
        })
    };

    let result = run_loop(config, transport, options, cancel, shutdown_tx.subscribe()).await;
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;
    result
}

/// The interval loop itself. Each pass is independent: a fatal error is
/// logged and the loop waits for the next tick.
pub async fn run_loop(
    config: Arc<SyncConfig>,
    transport: Arc<dyn Transport>,
    options: LoopOptions,
    cancel: CancelToken,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<LoopReport, DaemonError> {
    let mut report = LoopReport::default();
    let mut interval = tokio::time::interval(options.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = options.interval.as_secs(),
        dry_run = options.dry_run,
        "loop mode started"
    );

    loop {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                report.cancelled = cancel.is_cancelled();
                break;
            }
            _ = interval.tick() => {
                report.cycles += 1;
                let config = config.clone();
                let transport = transport.clone();
                let run_options = RunOptions {
                    dry_run: options.dry_run,
                    cancel: cancel.clone(),
                };
                let result = tokio::task::spawn_blocking(move || {
                    pipeline::run(&config, transport.as_ref(), &run_options)
                })
                .await
                .map_err(|err| DaemonError::Join {
                    task: "sync_pass",
                    message: err.to_string(),
                })?;

                match result {
                    Ok(pass) => {
                        report.cancelled = pass.summary.cancelled;
                        report.last = Some(pass.summary);
                    }
                    Err(err) => {
                        report.failed_cycles += 1;
                        tracing::error!(cycle = report.cycles, error = %err, "sync pass failed");
                    }
                }

                if report.cancelled {
                    break;
                }
                if options.max_cycles.is_some_and(|max| report.cycles >= max) {
                    break;
                }
                tracing::info!(
                    next_in_secs = options.interval.as_secs(),
                    "waiting for next pass"
                );
            }
        }
    }

    tracing::info!(
        cycles = report.cycles,
        failed = report.failed_cycles,
        cancelled = report.cancelled,
        "loop mode stopped"
    );
    Ok(report)
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}
