//! Status command handler

use anyhow::Result;

use quotes_core::{FilePersistence, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let config = store.config();
    let storage = FilePersistence::new(&config.data_dir);
    let total_size = storage.total_size();
    let categories = store.categories();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "sync_enabled": config.sync_enabled,
                    "remote_url": config.remote_url,
                    "sync_interval_secs": config.sync_interval_secs,
                    "storage": {
                        "data_dir": storage.data_dir(),
                        "total_size": total_size
                    },
                    "counts": {
                        "quotes": store.count(),
                        "categories": categories.len(),
                        "conflicts": store.conflicts().len()
                    },
                    "filter": store.selected_category()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.count());
        }
        OutputFormat::Human => {
            println!("Quotes Status");
            println!("=============");
            println!();
            println!("Sync:");
            println!(
                "  Status:   {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = config.remote_url {
                println!("  Remote:   {}", url);
            }
            println!("  Interval: {}s", config.sync_interval_secs);
            println!();
            println!("Storage:");
            println!("  Location: {}", storage.data_dir().display());
            println!("  Size:     {}", format_size(total_size));
            println!();
            println!("Contents:");
            println!("  Quotes:     {}", store.count());
            println!("  Categories: {}", categories.len());
            println!("  Filter:     {}", store.selected_category());
            println!("  Conflicts:  {}", store.conflicts().len());
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
