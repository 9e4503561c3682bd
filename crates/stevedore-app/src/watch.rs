//! The watch daemon: filesystem triggers, a periodic timer, and one worker
//! that runs every pass serially.
//!
//! Events from the incomplete directory are routed through two one-slot
//! queues, one per pass kind. A full queue means an equivalent pass is
//! already pending, so bursts of filesystem activity collapse into a single
//! run. Settle delays sit between an event and its request because the
//! client is still renaming and moving files when the event fires; they are
//! a heuristic, and the pass itself is safe to run at any time.

use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use stevedore_config::Settings;
use stevedore_qbit::DownloadClient;
use stevedore_sweep::{Sweeper, apply_limits};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::error::{AppError, AppResult};

/// What a filesystem event asks the worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A download appeared; claim it with share limits once it settles.
    Limits,
    /// A download left the directory; sweep once the client finishes moving.
    Sweep,
}

/// Run the daemon until interrupted.
pub(crate) async fn run(settings: Settings) -> AppResult<()> {
    let settings = Arc::new(settings);
    let client: Arc<dyn DownloadClient> = Arc::new(bootstrap::connect(&settings).await?);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result| {
        // Send failure means the daemon is already shutting down.
        let _ = event_tx.send(result);
    })
    .map_err(|err| AppError::watch("create", err))?;
    watcher
        .watch(&settings.watch.incomplete_dir, RecursiveMode::NonRecursive)
        .map_err(|err| AppError::watch("start", err))?;
    info!(
        path = %settings.watch.incomplete_dir.display(),
        interval_secs = settings.watch.sweep_interval_secs,
        "watching for downloads"
    );

    let (sweep_tx, sweep_rx) = mpsc::channel(1);
    let (limits_tx, limits_rx) = mpsc::channel(1);

    let router = tokio::spawn(route_events(
        event_rx,
        Arc::clone(&settings),
        sweep_tx.clone(),
        limits_tx,
    ));
    let timer = tokio::spawn(tick_sweeps(settings.watch.sweep_interval(), sweep_tx));

    tokio::select! {
        () = worker_loop(Arc::clone(&settings), client, sweep_rx, limits_rx) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!(error = %err, "failed to listen for the shutdown signal");
            }
            info!("shutting down");
        }
    }
    router.abort();
    timer.abort();
    drop(watcher);
    Ok(())
}

/// Turn raw watcher events into pass requests, spaced by the settle delays.
async fn route_events(
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    settings: Arc<Settings>,
    sweep_tx: mpsc::Sender<()>,
    limits_tx: mpsc::Sender<()>,
) {
    while let Some(result) = events.recv().await {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "filesystem watcher error");
                continue;
            }
        };
        match classify_event(&event.kind) {
            Some(Trigger::Limits) => {
                debug!(paths = ?event.paths, "new download; scheduling a share-limit pass");
                tokio::time::sleep(settings.watch.limits_settle()).await;
                request(&limits_tx);
            }
            Some(Trigger::Sweep) => {
                debug!(paths = ?event.paths, "download moved out; scheduling a sweep");
                tokio::time::sleep(settings.watch.sweep_settle()).await;
                request(&sweep_tx);
            }
            None => {}
        }
    }
}

/// Map an event kind to the pass it should trigger.
///
/// The client moves finished downloads out of the incomplete directory, which
/// the kernel may report as a removal or as the departing half of a rename.
const fn classify_event(kind: &EventKind) -> Option<Trigger> {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(Trigger::Limits)
        }
        EventKind::Remove(_)
        | EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Any)) => {
            Some(Trigger::Sweep)
        }
        _ => None,
    }
}

/// Queue a pass request; a full queue already covers this trigger.
fn request(tx: &mpsc::Sender<()>) {
    let _ = tx.try_send(());
}

/// Periodic catch-up sweeps. The first tick fires immediately, so a restart
/// clears any backlog without waiting a full interval.
async fn tick_sweeps(period: Duration, sweep_tx: mpsc::Sender<()>) {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        timer.tick().await;
        request(&sweep_tx);
    }
}

/// Drain both request queues, one pass at a time.
///
/// Pass failures are logged and dropped: every pass re-reads client state
/// from scratch, so the next trigger retries anything left undone. The loop
/// ends when both queues close.
async fn worker_loop(
    settings: Arc<Settings>,
    client: Arc<dyn DownloadClient>,
    mut sweep_rx: mpsc::Receiver<()>,
    mut limits_rx: mpsc::Receiver<()>,
) {
    let sweeper = Sweeper::new(Arc::clone(&settings), Arc::clone(&client));
    loop {
        tokio::select! {
            request = sweep_rx.recv() => {
                if request.is_none() {
                    return;
                }
                if let Err(err) = sweeper.sweep().await {
                    warn!(error = %err, "sweep pass failed; items stay eligible for the next pass");
                }
            }
            request = limits_rx.recv() => {
                if request.is_none() {
                    return;
                }
                if let Err(err) = apply_limits(client.as_ref(), &settings).await {
                    warn!(error = %err, "share-limit pass failed");
                }
            }
        }
    }
}
