//! Scheduled sweep jobs for periodic maintenance tasks.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use escola_common::SweepConfig;
use serde::{Deserialize, Serialize};
use tokio::time::interval;

/// Scheduled job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScheduledJob {
    /// Move pending consents past their deadline to expired.
    SweepExpiredConsents,
    /// Move pending invoices past their due date to overdue.
    SweepOverdueInvoices,
    /// Move active subscriptions past their period end to past-due, and
    /// past-due subscriptions past the grace period to blocked.
    SweepDelinquentSubscriptions,
    /// Aggregate last month's canteen sales into transfer rows.
    AggregateMonthlyTransfers,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval for the consent expiry sweep (default: 5 minutes).
    pub consent_expiry_interval: Duration,
    /// Interval for the invoice overdue sweep (default: 1 hour).
    pub invoice_overdue_interval: Duration,
    /// Interval for the subscription delinquency sweep (default: 1 hour).
    pub subscription_delinquency_interval: Duration,
    /// Interval for the monthly transfer aggregation (default: daily).
    pub monthly_transfer_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            consent_expiry_interval: Duration::from_secs(300),
            invoice_overdue_interval: Duration::from_secs(3600),
            subscription_delinquency_interval: Duration::from_secs(3600),
            monthly_transfer_interval: Duration::from_secs(86400),
        }
    }
}

impl From<&SweepConfig> for SchedulerConfig {
    fn from(config: &SweepConfig) -> Self {
        Self {
            consent_expiry_interval: Duration::from_secs(config.consent_expiry_secs),
            invoice_overdue_interval: Duration::from_secs(config.invoice_overdue_secs),
            subscription_delinquency_interval: Duration::from_secs(
                config.subscription_delinquency_secs,
            ),
            monthly_transfer_interval: Duration::from_secs(config.monthly_transfer_secs),
        }
    }
}

/// Scheduler state for tracking job runs.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub last_consent_sweep: Option<DateTime<Utc>>,
    pub last_invoice_sweep: Option<DateTime<Utc>>,
    pub last_delinquency_sweep: Option<DateTime<Utc>>,
    pub last_transfer_aggregation: Option<DateTime<Utc>>,
}

/// Job executor trait for scheduled sweeps.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Expire pending consents past their deadline. Returns rows moved.
    async fn sweep_expired_consents(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Mark pending invoices past their due date overdue. Returns rows
    /// moved.
    async fn sweep_overdue_invoices(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Advance delinquent subscriptions (active → past-due, past-due →
    /// blocked after the grace period). Returns rows moved.
    async fn sweep_delinquent_subscriptions(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Aggregate last month's canteen sales into transfer rows. Returns
    /// rows created.
    async fn aggregate_monthly_transfers(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the scheduler with the given configuration and executor.
pub async fn run_scheduler<E: JobExecutor + 'static>(config: SchedulerConfig, executor: Arc<E>) {
    let executor_consents = executor.clone();
    let executor_invoices = executor.clone();
    let executor_delinquency = executor.clone();
    let executor_transfers = executor;

    let consent_interval = config.consent_expiry_interval;
    let invoice_interval = config.invoice_overdue_interval;
    let delinquency_interval = config.subscription_delinquency_interval;
    let transfer_interval = config.monthly_transfer_interval;

    // Spawn consent expiry sweep
    tokio::spawn(async move {
        let mut interval = interval(consent_interval);
        loop {
            interval.tick().await;
            match executor_consents.sweep_expired_consents().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Expired pending consents past deadline");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to sweep expired consents");
                }
            }
        }
    });

    // Spawn invoice overdue sweep
    tokio::spawn(async move {
        let mut interval = interval(invoice_interval);
        loop {
            interval.tick().await;
            match executor_invoices.sweep_overdue_invoices().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Marked pending invoices overdue");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to sweep overdue invoices");
                }
            }
        }
    });

    // Spawn subscription delinquency sweep
    tokio::spawn(async move {
        let mut interval = interval(delinquency_interval);
        loop {
            interval.tick().await;
            match executor_delinquency.sweep_delinquent_subscriptions().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Advanced delinquent subscriptions");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to sweep delinquent subscriptions");
                }
            }
        }
    });

    // Spawn monthly transfer aggregation
    tokio::spawn(async move {
        let mut interval = interval(transfer_interval);
        loop {
            interval.tick().await;
            match executor_transfers.aggregate_monthly_transfers().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Aggregated monthly canteen transfers");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to aggregate monthly transfers");
                }
            }
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingExecutor {
        consents: AtomicU64,
        invoices: AtomicU64,
    }

    #[async_trait::async_trait]
    impl JobExecutor for CountingExecutor {
        async fn sweep_expired_consents(
            &self,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            self.consents.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn sweep_overdue_invoices(
            &self,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            self.invoices.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn sweep_delinquent_subscriptions(
            &self,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(0)
        }

        async fn aggregate_monthly_transfers(
            &self,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_scheduler_fires_sweeps() {
        let executor = Arc::new(CountingExecutor {
            consents: AtomicU64::new(0),
            invoices: AtomicU64::new(0),
        });

        let config = SchedulerConfig {
            consent_expiry_interval: Duration::from_millis(10),
            invoice_overdue_interval: Duration::from_millis(10),
            subscription_delinquency_interval: Duration::from_millis(10),
            monthly_transfer_interval: Duration::from_millis(10),
        };

        run_scheduler(config, executor.clone()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(executor.consents.load(Ordering::SeqCst) >= 1);
        assert!(executor.invoices.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_config_from_sweep_settings() {
        let sweeps = SweepConfig::default();
        let config = SchedulerConfig::from(&sweeps);
        assert_eq!(config.consent_expiry_interval, Duration::from_secs(300));
        assert_eq!(config.monthly_transfer_interval, Duration::from_secs(86400));
    }
}
