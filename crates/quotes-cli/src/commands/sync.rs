//! Sync command handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::Mutex;
use tracing::debug;

use quotes_core::sync::{spawn_sync_poller, SyncCommand, SyncEvent};
use quotes_core::{Config, HttpRemoteSource, PassOutcome, Store, SyncCoordinator};

use crate::output::Output;

/// Run a single reconciliation pass
pub async fn sync(store: Store, output: &Output) -> Result<()> {
    let source = remote_source(store.config())?;
    let coordinator = SyncCoordinator::new(source, store.config().fetch_limit);

    output.message(&format!(
        "Fetching quotes from {}...",
        coordinator.source().url()
    ));

    let store = Mutex::new(store);
    let outcome = coordinator.run_pass(&store).await.context("Sync failed")?;

    match outcome {
        PassOutcome::Applied(summary) => {
            output.print_summary(&summary);
            if summary.conflicts > 0 {
                output.message("Review conflicts with: quotes conflicts");
            }
        }
        PassOutcome::Skipped | PassOutcome::Stale => {
            output.message("Sync pass was not applied");
        }
    }

    Ok(())
}

/// Reconcile on an interval until Ctrl-C
pub async fn watch(store: Store, interval: Option<u64>, output: &Output) -> Result<()> {
    let config = store.config().clone();
    let source = remote_source(&config)?;
    let interval = Duration::from_secs(interval.unwrap_or(config.sync_interval_secs).max(1));

    output.message(&format!(
        "Watching {} every {}s (Ctrl-C to stop)",
        source.url(),
        interval.as_secs()
    ));

    let coordinator = Arc::new(SyncCoordinator::new(source, config.fetch_limit));
    let store = Arc::new(Mutex::new(store));
    let mut handle = spawn_sync_poller(coordinator, Arc::clone(&store), interval);

    loop {
        tokio::select! {
            event = handle.event_rx.recv() => match event {
                Some(SyncEvent::Completed(summary)) => {
                    if !summary.is_noop() || output.is_json() {
                        output.print_summary(&summary);
                    }
                }
                Some(SyncEvent::Skipped) => debug!("Previous pass still running"),
                Some(SyncEvent::Stale) => debug!("Discarded stale pass"),
                Some(SyncEvent::Error(e)) => {
                    if !output.is_quiet() {
                        eprintln!("⚠ Sync failed: {}", e);
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = handle.command_tx.send(SyncCommand::Shutdown).await;
                break;
            }
        }
    }

    let pending = store.lock().await.conflicts().len();
    if pending > 0 {
        output.message(&format!(
            "{} pending conflict(s). Review with: quotes conflicts",
            pending
        ));
    }
    Ok(())
}

fn remote_source(config: &Config) -> Result<HttpRemoteSource> {
    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             quotes config set sync_enabled true\n  \
             quotes config set remote_url https://your-server/posts"
        );
    }

    let Some(url) = config.sync_target() else {
        bail!(
            "Remote URL not configured. Set it with:\n  \
             quotes config set remote_url https://your-server/posts"
        );
    };

    Ok(HttpRemoteSource::new(url)?)
}
