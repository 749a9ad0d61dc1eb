use super::context::SyncContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Runs one pass at a time; a tick that arrives while a pass is still
/// running is skipped rather than queued.
#[derive(Clone, Default)]
struct PassRunner {
    running: Arc<Mutex<()>>,
}

impl PassRunner {
    async fn run(&self, trigger: &'static str) {
        let Ok(_guard) = self.running.try_lock() else {
            warn!(operation = "scheduled_sync_skipped", trigger, "Previous sync pass still running, skipping");
            return;
        };

        info!(operation = "scheduled_sync_start", trigger, "Starting activity sync");
        // Reload settings every pass so a token stored by another command is picked up
        let context = match SyncContext::load() {
            Ok(context) => context,
            Err(e) => {
                error!(operation = "scheduled_sync_error", error = %e, "Failed to load sync context");
                return;
            }
        };

        match context.activity_sync().reconcile(false).await {
            Ok(report) => info!(
                operation = "scheduled_sync_complete",
                trigger,
                outcome = %report.outcome,
                actions = report.actions.len(),
                failed_fetches = report.summary.failed_fetches,
                duration_ms = report.duration.as_millis() as u64,
                "Activity sync finished"
            ),
            Err(e) => error!(
                operation = "scheduled_sync_error",
                trigger,
                error = %e,
                "Activity sync failed"
            ),
        }
    }
}

pub async fn run_daemon(schedule_override: Option<String>, no_startup_sync: bool, output: &Output) -> Result<()> {
    let context = SyncContext::load()?;
    let schedule = schedule_override.unwrap_or_else(|| context.config.scheduler.schedule.clone());
    let run_on_startup = context.config.scheduler.run_on_startup && !no_startup_sync;
    drop(context);

    let runner = PassRunner::default();

    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;

    let job_runner = runner.clone();
    let job = Job::new_async(schedule.as_str(), move |_uuid, _scheduler| {
        let runner = job_runner.clone();
        Box::pin(async move {
            runner.run("schedule").await;
        })
    })
    .map_err(|e| eyre!("Invalid cron schedule '{}': {}", schedule, e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| eyre!("Failed to register sync job: {}", e))?;

    output.info(format!("FlickList sync daemon running on schedule '{}' (Ctrl+C to stop)", schedule));

    if run_on_startup {
        runner.run("startup").await;
    }

    scheduler
        .start()
        .await
        .map_err(|e| eyre!("Failed to start scheduler: {}", e))?;
    info!(operation = "scheduler_started", schedule = %schedule, "Scheduler started");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for shutdown signal: {}", e))?;

    info!(operation = "scheduler_stopping", "Shutdown requested, waiting for the current pass");
    // Let an in-flight pass finish before exiting
    let _guard = runner.running.lock().await;
    scheduler
        .shutdown()
        .await
        .map_err(|e| eyre!("Failed to stop scheduler: {}", e))?;
    output.success("FlickList sync daemon stopped");
    Ok(())
}
