//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use quotes_core::{Conflict, Origin, ReconcileSummary, Record};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single quote
    pub fn print_quote(&self, quote: &Record) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", quote.id);
                println!("Text:     {}", quote.text);
                println!("Category: {}", quote.category);
                println!("Origin:   {}", origin_label(quote));
                println!("Updated:  {}", quote.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(quote),
            OutputFormat::Quiet => println!("{}", quote.id),
        }
    }

    /// Print a list of quotes
    pub fn print_quotes(&self, quotes: &[&Record]) {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("No quotes found.");
                    return;
                }
                for quote in quotes {
                    println!(
                        "{} | {} | {}",
                        pad(&quote.id, 28),
                        truncate(&quote.text, 60),
                        quote.category
                    );
                }
                println!("\n{} quote(s)", quotes.len());
            }
            OutputFormat::Json => print_json(&quotes),
            OutputFormat::Quiet => {
                for quote in quotes {
                    println!("{}", quote.id);
                }
            }
        }
    }

    /// Print categories, marking the selected filter
    pub fn print_categories(&self, categories: &[String], selected: &str) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for category in categories {
                    let marker = if category == selected { "*" } else { " " };
                    println!("{} {}", marker, category);
                }
                println!("\n{} categories, filter: {}", categories.len(), selected);
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "categories": categories,
                "selected": selected
            })),
            OutputFormat::Quiet => {
                for category in categories {
                    println!("{}", category);
                }
            }
        }
    }

    /// Print pending conflicts side by side
    pub fn print_conflicts(&self, conflicts: &[Conflict]) {
        match self.format {
            OutputFormat::Human => {
                if conflicts.is_empty() {
                    println!("No pending conflicts.");
                    return;
                }
                for conflict in conflicts {
                    println!("────────────────────────────────────────");
                    println!("Conflict: {}", conflict.conflict_id);
                    println!(
                        "  local:  [{}] {} ({})",
                        conflict.local.category,
                        truncate(&conflict.local.text, 50),
                        conflict.local.id
                    );
                    println!(
                        "  server: [{}] {} ({})",
                        conflict.remote.category,
                        truncate(&conflict.remote.text, 50),
                        conflict.remote.id
                    );
                }
                println!("\n{} conflict(s)", conflicts.len());
                println!("Resolve with: quotes resolve <id> --keep local|server");
            }
            OutputFormat::Json => print_json(&conflicts),
            OutputFormat::Quiet => {
                for conflict in conflicts {
                    println!("{}", conflict.conflict_id);
                }
            }
        }
    }

    /// Print the counts from a reconciliation pass
    pub fn print_summary(&self, summary: &ReconcileSummary) {
        match self.format {
            OutputFormat::Human => {
                if summary.is_noop() {
                    println!("✓ Sync complete - already up to date");
                } else {
                    println!("✓ Sync complete");
                    println!(
                        "  Added: {}, Updated: {}, Conflicts: {}",
                        summary.added, summary.updated, summary.conflicts
                    );
                }
                if summary.dropped > 0 {
                    println!("  Skipped {} malformed item(s)", summary.dropped);
                }
            }
            OutputFormat::Json => print_json(summary),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Where a record's id was minted
fn origin_label(quote: &Record) -> &'static str {
    match quote.origin() {
        Some(Origin::Local) => "local",
        Some(Origin::Server) => "server",
        None => "imported",
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Right-pad to a fixed width so columns line up
fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width), width = width)
}
