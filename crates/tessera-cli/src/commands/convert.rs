//! Convert command implementation

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use tessera::prelude::*;

pub fn execute(
    source: PathBuf,
    destination: PathBuf,
    mode: &str,
    config: Option<PathBuf>,
) -> Result<()> {
    let mode: SaveMode = mode.parse()?;
    let config = match config {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<DatastoreConfig>(&text).context("Invalid config file")?
        }
        None => DatastoreConfig::default(),
    };

    tracing::info!(
        "Converting {} to {} ({})",
        source.display(),
        destination.display(),
        mode
    );

    let events = EventManager::new();
    let store = Datastore::with_config(events, config);
    store.set_storage(open_dataset(&source).context("Failed to open source dataset")?);

    let saved = store
        .save_to(mode, &destination)
        .context("Failed to write destination dataset")?;
    store.close()?;

    let Some(count) = saved.get_num_images() else {
        bail!("Destination dataset has no storage");
    };
    println!(
        "✓ Wrote {} image(s) to {} as {}",
        count,
        destination.display(),
        mode
    );

    Ok(())
}
