//! Quote command handlers

use anyhow::{bail, Context, Result};

use quotes_core::{Record, Store, ALL_CATEGORIES};

use crate::output::Output;

/// Add a new quote
pub fn add(store: &mut Store, text: String, category: String, output: &Output) -> Result<()> {
    if text.trim().is_empty() || category.trim().is_empty() {
        bail!("Please enter both a quote and a category.");
    }

    let quote = store
        .add_quote(&text, &category)
        .context("Failed to add quote")?;

    output.success(&format!("Added quote: {}", quote.id));
    if !output.is_quiet() {
        output.print_quote(&quote);
    }
    Ok(())
}

/// List quotes in a category, or those matching the selected filter
pub fn list(store: &Store, category: Option<String>, output: &Output) -> Result<()> {
    let quotes: Vec<&Record> = match category.as_deref().map(str::trim) {
        Some(ALL_CATEGORIES) => store.all().iter().collect(),
        Some(c) => store.records().in_category(c).collect(),
        None => store.filtered(),
    };

    output.print_quotes(&quotes);
    Ok(())
}

/// Remove a quote
pub fn remove(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let Some(removed) = store.remove(&id).context("Failed to remove quote")? else {
        bail!("Quote not found: {}", id);
    };

    output.success(&format!("Removed quote: {}", removed.id));
    Ok(())
}
