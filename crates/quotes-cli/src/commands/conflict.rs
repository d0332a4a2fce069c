//! Conflict command handlers

use anyhow::{Context, Result};

use quotes_core::{Resolution, Store};

use crate::output::Output;

/// List pending conflicts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_conflicts(store.conflicts());
    Ok(())
}

/// Resolve a pending conflict
///
/// An unknown id is reported but is not an error.
pub fn resolve(store: &mut Store, id: String, keep: Resolution, output: &Output) -> Result<()> {
    if store.conflict(&id).is_none() {
        output.message(&format!("No pending conflict: {}", id));
        return Ok(());
    }

    let resolved = store
        .resolve(&id, keep)
        .context("Failed to resolve conflict")?;

    match resolved {
        Some(conflict) => {
            let kept = match keep {
                Resolution::KeepLocal => &conflict.local,
                Resolution::KeepServer => &conflict.remote,
            };
            output.success(&format!("Kept {} version: {}", keep, kept.id));
        }
        None => output.message(&format!("Conflict {} was already resolved", id)),
    }
    Ok(())
}
