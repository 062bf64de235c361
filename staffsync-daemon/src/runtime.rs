use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use staffsync_core::config::ServerConfig;
use staffsync_core::StaffsyncConfig;
use staffsync_sync::{ReconcileReport, SyncContext, SyncError};

use crate::error::{io_err, DaemonError};
use crate::routes::{router, AppState};

struct ReconcileJob {
    source: &'static str,
    respond_to: oneshot::Sender<Result<ReconcileReport, SyncError>>,
}

/// Handle for submitting reconciliation runs to the single processor task.
/// Runs never overlap within one daemon.
#[derive(Clone)]
pub struct ReconcileQueue {
    jobs: mpsc::Sender<ReconcileJob>,
}

impl ReconcileQueue {
    /// Enqueue a run and wait for its report.
    pub async fn run(&self, source: &'static str) -> Result<ReconcileReport, DaemonError> {
        let (tx, rx) = oneshot::channel();
        self.jobs
            .send(ReconcileJob {
                source,
                respond_to: tx,
            })
            .await
            .map_err(|_| DaemonError::ChannelClosed("reconcile queue"))?;

        let outcome = rx
            .await
            .map_err(|_| DaemonError::ChannelClosed("reconcile response"))?;
        Ok(outcome?)
    }
}

/// Start the daemon and block the current thread until it exits.
pub fn start_blocking(config: StaffsyncConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon against the Google Sheets and PostgREST surfaces named in
/// `config`.
pub async fn run(config: StaffsyncConfig) -> Result<(), DaemonError> {
    let ctx = SyncContext::from_config(&config)?;
    run_with_context(ctx, &config.server).await
}

/// Run the daemon against any pair of surfaces.
pub async fn run_with_context(ctx: SyncContext, server: &ServerConfig) -> Result<(), DaemonError> {
    let listener = TcpListener::bind(&server.bind)
        .await
        .map_err(|e| io_err(format!("bind {}", server.bind), e))?;
    tracing::info!(bind = %server.bind, "staffsync daemon listening");

    let (shutdown_tx, _) = broadcast::channel::<()>(16);
    let (queue, processor_handle) = spawn_processor(ctx.clone(), &shutdown_tx);

    let schedule_handle = {
        let shutdown = shutdown_tx.clone();
        let queue = queue.clone();
        let interval = server.sync_interval_secs.map(Duration::from_secs);
        tokio::spawn(async move {
            match interval {
                Some(period) => schedule_task(queue, period, shutdown.subscribe()).await,
                None => Ok(()),
            }
        })
    };

    let http_handle = {
        let shutdown = shutdown_tx.clone();
        let app = router(AppState::new(ctx, queue));
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .map_err(|e| io_err("http server", e));
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Task(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (processor_result, schedule_result, http_result, signal_result) =
        tokio::join!(processor_handle, schedule_handle, http_handle, signal_handle);

    handle_join("reconcile_processor", processor_result)?;
    handle_join("schedule", schedule_result)?;
    handle_join("http_server", http_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Spawn the reconcile processor. It stops on the first shutdown broadcast or
/// once every [`ReconcileQueue`] handle is dropped.
pub fn spawn_processor(
    ctx: SyncContext,
    shutdown: &broadcast::Sender<()>,
) -> (ReconcileQueue, JoinHandle<Result<(), DaemonError>>) {
    let (jobs_tx, jobs_rx) = mpsc::channel::<ReconcileJob>(64);
    let shutdown = shutdown.clone();
    let shutdown_rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let result = processor_task(ctx, jobs_rx, shutdown_rx).await;
        let _ = shutdown.send(());
        result
    });
    (ReconcileQueue { jobs: jobs_tx }, handle)
}

async fn processor_task(
    ctx: SyncContext,
    mut jobs: mpsc::Receiver<ReconcileJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = jobs.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();

                let run_ctx = ctx.clone();
                let outcome = tokio::task::spawn_blocking(move || run_ctx.reconcile())
                    .await
                    .map_err(|err| DaemonError::Task(format!("reconcile task join error: {err}")))?;

                match &outcome {
                    Ok(report) => tracing::info!(
                        source = job.source,
                        added = report.sheet_to_db.added,
                        updated = report.sheet_to_db.updated,
                        exported = report.db_to_sheet,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "reconcile finished"
                    ),
                    Err(err) => tracing::error!(source = job.source, error = %err, "reconcile failed"),
                }
                let _ = job.respond_to.send(outcome);
            }
        }
    }
    Ok(())
}

async fn schedule_task(
    queue: ReconcileQueue,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                match queue.run("schedule").await {
                    Ok(_) => {}
                    Err(DaemonError::ChannelClosed(_)) => break,
                    // Already logged by the processor.
                    Err(DaemonError::Sync(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }
    }
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Task(format!("{task} task join failure: {err}"))),
    }
}

/// Install the fmt subscriber on stderr (`RUST_LOG`, default `info`). `log`
/// records from the library crates are forwarded.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use staffsync_sheets::MemoryGrid;
    use staffsync_store::MemoryStore;

    use super::*;

    fn context(grid: Arc<MemoryGrid>, store: Arc<MemoryStore>) -> SyncContext {
        SyncContext::new(grid, store, "Sheet1")
    }

    #[tokio::test]
    async fn queued_runs_are_processed_in_order() {
        let grid = Arc::new(MemoryGrid::with_rows(
            "Sheet1",
            &[&["ID", "Name", "Email"], &["E1", "Alice", "a@x.com"]],
        ));
        let store = Arc::new(MemoryStore::new());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, handle) = spawn_processor(context(grid, store.clone()), &shutdown_tx);

        let first = queue.run("test").await.expect("first run");
        let second = queue.run("test").await.expect("second run");

        assert_eq!(first.sheet_to_db.added, 1);
        assert_eq!(second.sheet_to_db.added, 0);
        assert_eq!(store.sync_logs().len(), 2);

        shutdown_tx.send(()).expect("shutdown");
        handle.await.expect("join").expect("processor");
    }

    #[tokio::test]
    async fn failed_run_is_returned_to_the_caller() {
        let grid = Arc::new(MemoryGrid::new());
        grid.set_offline(true);
        let store = Arc::new(MemoryStore::new());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, _handle) = spawn_processor(context(grid, store), &shutdown_tx);

        let err = queue.run("test").await.unwrap_err();
        assert!(matches!(err, DaemonError::Sync(SyncError::Grid(_))));
    }

    #[tokio::test]
    async fn closed_queue_reports_channel_closed() {
        let store = Arc::new(MemoryStore::new());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, handle) =
            spawn_processor(context(Arc::new(MemoryGrid::new()), store), &shutdown_tx);
        shutdown_tx.send(()).expect("shutdown");
        handle.await.expect("join").expect("processor");

        let err = queue.run("test").await.unwrap_err();
        assert!(matches!(err, DaemonError::ChannelClosed(_)));
    }

    #[tokio::test]
    async fn schedule_enqueues_after_each_period() {
        let grid = Arc::new(MemoryGrid::with_rows("Sheet1", &[&["ID"]]));
        let store = Arc::new(MemoryStore::new());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, _processor) = spawn_processor(context(grid, store.clone()), &shutdown_tx);

        let schedule = tokio::spawn(schedule_task(
            queue,
            Duration::from_millis(40),
            shutdown_tx.subscribe(),
        ));

        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(()).expect("shutdown");
        schedule.await.expect("join").expect("schedule");

        assert!(store.sync_logs().len() >= 2, "expected at least two scheduled runs");
    }
}
