use super::context::SyncContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use flicklist_core::{CacheStore, IndexStore};
use std::fs;

pub async fn run_clear(all: bool, cache: bool, expired: bool, settings: bool, output: &Output) -> Result<()> {
    if !(all || cache || expired || settings) {
        output.warn("No clear option specified. Use --cache, --expired, --settings, or --all");
        output.println("\nExample: flicklist clear --expired");
        return Ok(());
    }

    let context = SyncContext::load()?;

    if all || cache {
        clear_cache(&context, output)?;
    } else if expired {
        purge_expired(&context, output)?;
    }

    if all || settings {
        clear_settings(&context, output)?;
    }

    if all {
        output.success("All cached data and settings cleared");
    }
    Ok(())
}

fn clear_cache(context: &SyncContext, output: &Output) -> Result<()> {
    context
        .cache
        .invalidate_all("cleared from the command line")
        .map_err(|e| eyre!("Failed to clear cache: {}", e))?;
    context
        .index
        .clear()
        .map_err(|e| eyre!("Failed to clear watched/progress indexes: {}", e))?;
    output.success(format!("Cleared cache: {}", context.paths.cache_dir().display()));
    Ok(())
}

fn purge_expired(context: &SyncContext, output: &Output) -> Result<()> {
    let removed = context
        .cache
        .purge_expired()
        .map_err(|e| eyre!("Failed to purge expired partitions: {}", e))?;
    if removed == 0 {
        output.info("No expired partitions found");
    } else {
        output.success(format!("Purged {} expired partition(s)", removed));
    }
    Ok(())
}

fn clear_settings(context: &SyncContext, output: &Output) -> Result<()> {
    let settings_file = context.paths.settings_file();
    if settings_file.exists() {
        fs::remove_file(&settings_file)
            .map_err(|e| eyre!("Failed to remove settings at {}: {}", settings_file.display(), e))?;
        output.success(format!("Cleared settings: {}", settings_file.display()));
    } else {
        output.info("No settings file found to clear");
    }
    Ok(())
}
