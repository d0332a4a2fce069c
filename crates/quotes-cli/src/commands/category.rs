//! Category command handlers

use anyhow::Result;

use quotes_core::Store;

use crate::output::Output;

/// List all categories
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_categories(&store.categories(), store.selected_category());
    Ok(())
}

/// Select a category filter (or show the current one) and list matches
pub fn filter(store: &mut Store, category: Option<String>, output: &Output) -> Result<()> {
    if let Some(requested) = category {
        let selected = store.set_selected_category(&requested)?.to_string();
        if selected != requested.trim() {
            output.message(&format!(
                "Unknown category '{}', showing all quotes",
                requested
            ));
        } else {
            output.success(&format!("Filter set to: {}", selected));
        }
    } else {
        output.message(&format!("Filter: {}", store.selected_category()));
    }

    output.print_quotes(&store.filtered());
    Ok(())
}
