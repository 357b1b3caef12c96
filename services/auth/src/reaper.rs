//! Scheduled removal of expired sessions and reset tokens
//!
//! Validity never depends on this job; expired rows are already rejected at
//! read time. The reaper only keeps the table small.

use anyhow::Result;
use chrono::Utc;
use common::session::SessionRepository;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Start the reaper on `schedule` (six-field cron expression)
///
/// The returned scheduler must be kept alive for the job to keep running.
pub async fn start_session_reaper(
    sessions: SessionRepository,
    schedule: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_, _| {
        let sessions = sessions.clone();
        Box::pin(async move {
            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired session(s)", removed),
                Err(e) => error!("Failed to purge expired sessions: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started session reaper with schedule: {}", schedule);
    Ok(scheduler)
}
