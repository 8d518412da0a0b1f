use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::server::{
    dynamic::DynamicConfig, error::AppError, service::configuration::ConfigurationService,
};

/// Starts the configuration refresh scheduler
///
/// Every tick loads the active configuration rows and pushes them into the runtime
/// components. A failed refresh leaves the previous state in effect and is retried on
/// the next tick.
///
/// # Arguments
/// - `db`: Database connection
/// - `dynamic`: Runtime components to configure
/// - `cron`: Six-field cron expression
/// - `timeout`: Deadline of each refresh query
pub async fn start_scheduler(
    db: DatabaseConnection,
    dynamic: Arc<DynamicConfig>,
    cron: &str,
    timeout: Duration,
) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let db = db.clone();
        let dynamic = dynamic.clone();

        Box::pin(async move {
            if let Err(e) = ConfigurationService::new(&db)
                .refresh(&dynamic, timeout)
                .await
            {
                error!("Error refreshing configuration: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron = %cron, "Configuration refresh scheduler started");

    Ok(scheduler)
}
