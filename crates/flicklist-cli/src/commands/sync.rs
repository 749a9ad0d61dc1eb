use super::context::SyncContext;
use super::sync_ui::SyncSpinner;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use flicklist_core::{SyncOutcome, SyncReport};

pub async fn run_sync(force: bool, output: &Output) -> Result<()> {
    tracing::debug!(force, "Sync command started");

    let context = SyncContext::load()?;
    let report = run_pass(&context, force, output).await?;
    output.report(&report);

    if report.outcome == SyncOutcome::FetchFailed {
        return Err(eyre!("Could not reach FlickList; the local cache was left as it was"));
    }
    Ok(())
}

/// One pass with a spinner around it; shared with `auth set-token`
pub async fn run_pass(context: &SyncContext, force: bool, output: &Output) -> Result<SyncReport> {
    let message = if force {
        "Refreshing everything from FlickList..."
    } else {
        "Checking FlickList for changes..."
    };
    let spinner = SyncSpinner::start(message, output.is_human() && !output.is_quiet());
    let result = context.activity_sync().reconcile(force).await;
    spinner.finish();

    result.map_err(|e| eyre!("Sync failed: {:#}", e))
}
