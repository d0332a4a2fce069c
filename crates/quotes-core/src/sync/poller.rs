//! Background sync poller
//!
//! Triggers a pass on a fixed interval (and on demand), reporting each
//! outcome as a [`SyncEvent`]. Passes run as their own tasks so that a
//! slow fetch never delays the next tick; overlap is handled by the
//! coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::coordinator::{PassOutcome, SyncCoordinator};
use super::remote::RemoteSource;
use crate::reconcile::ReconcileSummary;
use crate::store::Store;

/// Commands sent to the sync task
#[derive(Debug)]
pub enum SyncCommand {
    /// Run a pass now, outside the schedule
    SyncNow,
    /// Stop polling and discard any pass in flight
    Shutdown,
}

/// Events from the sync task
#[derive(Debug)]
pub enum SyncEvent {
    /// A pass merged the remote batch
    Completed(ReconcileSummary),
    /// A pass was requested while another was running
    Skipped,
    /// A pass finished after shutdown and was discarded
    Stale,
    /// A pass failed; the store is unchanged
    Error(String),
}

/// Handle for controlling the background sync task
pub struct SyncHandle {
    pub command_tx: mpsc::Sender<SyncCommand>,
    pub event_rx: mpsc::Receiver<SyncEvent>,
}

/// Spawn a background task that runs a pass every `interval`
///
/// The first pass starts immediately.
pub fn spawn_sync_poller<R>(
    coordinator: Arc<SyncCoordinator<R>>,
    store: Arc<Mutex<Store>>,
    interval: Duration,
) -> SyncHandle
where
    R: RemoteSource + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);

    tokio::spawn(sync_poller_task(
        coordinator,
        store,
        interval,
        command_rx,
        event_tx,
    ));

    SyncHandle {
        command_tx,
        event_rx,
    }
}

async fn sync_poller_task<R>(
    coordinator: Arc<SyncCoordinator<R>>,
    store: Arc<Mutex<Store>>,
    interval: Duration,
    mut command_rx: mpsc::Receiver<SyncCommand>,
    event_tx: mpsc::Sender<SyncEvent>,
) where
    R: RemoteSource + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                spawn_pass(&coordinator, &store, &event_tx);
            }
            cmd = command_rx.recv() => match cmd {
                Some(SyncCommand::SyncNow) => spawn_pass(&coordinator, &store, &event_tx),
                Some(SyncCommand::Shutdown) | None => {
                    coordinator.invalidate();
                    break;
                }
            }
        }
    }

    debug!("Sync poller stopped");
}

fn spawn_pass<R>(
    coordinator: &Arc<SyncCoordinator<R>>,
    store: &Arc<Mutex<Store>>,
    event_tx: &mpsc::Sender<SyncEvent>,
) where
    R: RemoteSource + 'static,
{
    let coordinator = Arc::clone(coordinator);
    let store = Arc::clone(store);
    let event_tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match coordinator.run_pass(&store).await {
            Ok(PassOutcome::Applied(summary)) => SyncEvent::Completed(summary),
            Ok(PassOutcome::Skipped) => SyncEvent::Skipped,
            Ok(PassOutcome::Stale) => SyncEvent::Stale,
            Err(e) => {
                warn!("Sync pass failed: {:#}", e);
                SyncEvent::Error(format!("{:#}", e))
            }
        };
        let _ = event_tx.send(event).await;
    });
}
