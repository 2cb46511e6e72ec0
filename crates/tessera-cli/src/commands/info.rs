//! Info command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use tessera::prelude::*;

pub fn execute(path: PathBuf) -> Result<()> {
    tracing::info!("Reading dataset: {}", path.display());

    let storage = open_dataset(&path).context("Failed to open dataset")?;

    println!("\nDataset");
    println!("{}", "=".repeat(60));
    println!("Path: {}", path.display());
    println!("Images: {}", storage.get_num_images());

    let summary = storage.get_summary_metadata().unwrap_or_default();
    if let Some(name) = summary.name() {
        println!("Name: {}", name);
    }
    if let Some(start) = summary.start_date() {
        println!("Started: {}", start.to_rfc3339());
    }
    if let Some(order) = summary.axis_order() {
        println!("Axis order: {}", order.join(", "));
    }

    println!("\nAxes:");
    let axes = storage.get_axes();
    if axes.is_empty() {
        println!("  (none)");
    }
    for name in &axes {
        let length = storage.get_max_index(name) + 1;
        let intended = summary
            .intended_dimensions()
            .and_then(|dims| dims.index(name));
        match intended {
            Some(intended) => println!("  {:<12} {} of {}", name, length, intended),
            None => println!("  {:<12} {}", name, length),
        }
    }

    if let Some(channels) = summary.channel_names() {
        println!("\nChannels: {}", channels.join(", "));
    }

    Ok(())
}
