//! History Command
//!
//! List saved report snapshots or print one of them.
//!
//! Usage:
//!   seoplan history [-f json]
//!   seoplan history <ID-PREFIX>

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::config::ConfigLoader;
use crate::storage::ReportStore;
use crate::types::{Result, SeoError};

pub fn run(id: Option<&str>, format: &str, directory: Option<PathBuf>) -> Result<()> {
    let mut output = ConfigLoader::load()?.output;
    if let Some(dir) = directory {
        output.directory = dir;
    }
    let store = ReportStore::from_config(&output);
    let rt = Runtime::new()?;

    if let Some(id) = id {
        let report = rt
            .block_on(store.load(id))?
            .ok_or_else(|| SeoError::Config(format!("No report matches '{}'", id)))?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summaries = rt.block_on(store.list())?;

    if format == "json" {
        let entries: Vec<serde_json::Value> = summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "createdAt": s.created_at,
                    "path": s.path,
                    "urls": s.url_count,
                    "days": s.days,
                    "actions": s.actions,
                    "failedBatches": s.failed_batches,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No reports in {}.", store.dir().display());
        println!("Run 'seoplan audit <urls-file>' to create one.");
        return Ok(());
    }

    println!("Reports in {}", store.dir().display());
    println!("══════════════════════════════════════");
    for s in &summaries {
        println!(
            "{}  {}  {:>3} urls  {:>2} days  {:>3} actions{}",
            &s.id.to_string()[..8],
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.url_count,
            s.days,
            s.actions,
            if s.failed_batches > 0 {
                format!("  ({} failed batches)", s.failed_batches)
            } else {
                String::new()
            }
        );
    }
    Ok(())
}
