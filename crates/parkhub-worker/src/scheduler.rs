//! Cron scheduler for the maintenance tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, info};

use parkhub_core::config::SessionConfig;
use parkhub_core::error::AppError;

use crate::jobs::MaintenanceTasks;

/// Runs [`MaintenanceTasks`] on the configured cron schedules.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
    tasks: MaintenanceTasks,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    pub async fn new(tasks: MaintenanceTasks) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler, tasks })
    }

    /// Register the blacklist prune and the expired-record sweep.
    pub async fn register(&self, config: &SessionConfig) -> Result<(), AppError> {
        self.register_blacklist_prune(&config.blacklist_prune_cron)
            .await?;
        self.register_session_sweep(&config.cleanup_cron).await?;
        info!("Maintenance tasks registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Maintenance scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shut down scheduler: {e}")))?;
        info!("Maintenance scheduler shut down");
        Ok(())
    }

    async fn register_blacklist_prune(&self, schedule: &str) -> Result<(), AppError> {
        let tasks = self.tasks.clone();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let tasks = tasks.clone();
            Box::pin(async move {
                debug!("Running blacklist prune");
                tasks.prune_blacklist().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid blacklist prune schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add blacklist prune: {e}")))?;
        info!(schedule, "Registered: blacklist_prune");
        Ok(())
    }

    async fn register_session_sweep(&self, schedule: &str) -> Result<(), AppError> {
        let tasks = self.tasks.clone();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let tasks = tasks.clone();
            Box::pin(async move {
                debug!("Running expired record sweep");
                tasks.sweep_expired().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid session sweep schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add session sweep: {e}")))?;
        info!(schedule, "Registered: session_sweep");
        Ok(())
    }
}
