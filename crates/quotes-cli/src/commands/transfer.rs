//! Import and export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use quotes_core::transfer::export_file_name;
use quotes_core::Store;

use crate::output::{Output, OutputFormat};

/// Import quotes from a JSON file
pub fn import(store: &mut Store, file: PathBuf, output: &Output) -> Result<()> {
    let payload = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file: {:?}", file))?;

    let summary = store
        .import_json(&payload)
        .with_context(|| format!("Failed to import {:?}", file))?;

    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!(summary)),
        _ => output.success(&format!(
            "Quotes imported successfully! ({} new, {} replaced)",
            summary.added, summary.replaced
        )),
    }
    Ok(())
}

/// Export all quotes to a JSON file
pub fn export(store: &Store, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = file.unwrap_or_else(|| PathBuf::from(export_file_name()));
    let json = store.export_json()?;

    std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;

    output.success(&format!(
        "Exported {} quote(s) to {}",
        store.count(),
        path.display()
    ));
    if output.is_quiet() {
        println!("{}", path.display());
    }
    Ok(())
}
