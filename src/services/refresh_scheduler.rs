use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::services::market_data_service::MarketDataService;

#[derive(Debug, thiserror::Error)]
#[error("Scheduler error: {0}")]
pub struct SchedulerError(String);

/// Cron-driven background refresh of one topic
pub struct RefreshScheduler {
    scheduler: JobScheduler,
    service: Arc<MarketDataService>,
}

impl RefreshScheduler {
    pub async fn new(service: Arc<MarketDataService>) -> Result<Self, SchedulerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, service })
    }

    /// Register the refresh job (format: sec min hour day month weekday) and
    /// start ticking.
    pub async fn start(&mut self, schedule: &str, topic: String) -> Result<(), SchedulerError> {
        let service = self.service.clone();
        let topic = Arc::new(topic);
        let job_topic = topic.clone();

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let service = service.clone();
            let topic = job_topic.clone();
            Box::pin(async move {
                info!("🏃 Starting scheduled refresh: {}", topic);
                match service.fetch(Some(topic.as_str())).await {
                    Ok(report) => info!(
                        "✅ Scheduled refresh completed ({} charts, {} sources)",
                        report.charts.len(),
                        report.sources.len()
                    ),
                    Err(e) => error!("❌ Scheduled refresh failed: {}", e),
                }
            })
        })
        .map_err(|e| SchedulerError(format!("Failed to create refresh job: {}", e)))?;

        self.scheduler.add(job)
            .await
            .map_err(|e| SchedulerError(format!("Failed to add refresh job: {}", e)))?;

        self.scheduler.start()
            .await
            .map_err(|e| SchedulerError(format!("Failed to start scheduler: {}", e)))?;

        info!("📅 Scheduled: market refresh for '{}' [cron: {}]", topic, schedule);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        info!("🛑 Stopping refresh scheduler...");
        self.scheduler.shutdown()
            .await
            .map_err(|e| SchedulerError(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Refresh scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::report_store::ReportStore;

    fn disabled_service() -> Arc<MarketDataService> {
        Arc::new(MarketDataService::new(None, ReportStore::new(), "topic".to_string()))
    }

    #[tokio::test]
    async fn test_invalid_cron_expression_is_rejected() {
        let mut scheduler = RefreshScheduler::new(disabled_service()).await.unwrap();
        let result = scheduler.start("not a cron", "topic".to_string()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_starts_and_stops() {
        let mut scheduler = RefreshScheduler::new(disabled_service()).await.unwrap();
        scheduler.start("0 0 */6 * * *", "topic".to_string()).await.unwrap();
        scheduler.stop().await.unwrap();
    }
}
