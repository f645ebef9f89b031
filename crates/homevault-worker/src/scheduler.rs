//! Cron scheduler for periodic reconciliation.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};

use homevault_core::error::{AppError, ErrorKind};

use crate::scan::Scanner;

/// Runs scan-deleted then scan-new on a cron expression.
pub struct ScanScheduler {
    scheduler: JobScheduler,
    scanner: Scanner,
}

impl std::fmt::Debug for ScanScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanScheduler").finish()
    }
}

impl ScanScheduler {
    /// Create a scheduler for `scanner`.
    pub async fn new(scanner: Scanner) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, scanner })
    }

    /// Register the reconciliation job, e.g. `"0 0 3 * * *"` for 03:00
    /// daily (seconds field first).
    pub async fn register(&self, schedule: &str) -> Result<(), AppError> {
        let scanner = self.scanner.clone();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let scanner = scanner.clone();
            Box::pin(async move {
                match scanner.scan_all().await {
                    Ok(report) => info!(
                        files_removed = report.deleted.files_removed.len(),
                        dirs_removed = report.deleted.dirs_removed.len(),
                        created = report.new.created(),
                        "Scheduled reconciliation finished"
                    ),
                    Err(e) if e.is(ErrorKind::Conflict) => {
                        info!("Scheduled reconciliation skipped, a scan is already running")
                    }
                    Err(e) => error!(error = %e, "Scheduled reconciliation failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid scan schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add scan job: {e}")))?;

        info!(schedule, "Scheduled reconciliation registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Scan scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Scan scheduler shut down");
        Ok(())
    }
}
