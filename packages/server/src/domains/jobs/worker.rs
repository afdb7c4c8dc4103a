//! Bulk job worker - the single-flight queue consumer.
//!
//! A cancellable poll loop: each tick claims at most one queued job (global
//! FIFO), runs the processor for its kind, and finalizes the terminal state.
//! Failures refund the job's stored credit cost in full. The loop is the
//! terminal catch - processor errors become a status change, never a live
//! panic or a dead worker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::credits::Shop;
use crate::domains::jobs::models::bulk_job::{BulkJob, JobKind};
use crate::domains::jobs::processors;
use crate::kernel::ServerDeps;

/// Configuration for the bulk job worker.
#[derive(Debug, Clone)]
pub struct BulkJobWorkerConfig {
    /// How long to wait between queue polls
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for BulkJobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl BulkJobWorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that drains the bulk job queue one job at a time.
pub struct BulkJobWorker {
    deps: Arc<ServerDeps>,
    config: BulkJobWorkerConfig,
}

impl BulkJobWorker {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self {
            deps,
            config: BulkJobWorkerConfig::default(),
        }
    }

    pub fn with_config(deps: Arc<ServerDeps>, config: BulkJobWorkerConfig) -> Self {
        Self { deps, config }
    }

    /// Run until the token is cancelled.
    ///
    /// Each tick attempts to claim and fully process at most one job before
    /// sleeping again. Errors are logged and the loop continues - a bad job
    /// never takes the worker down.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "bulk job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.run_next_job().await {
                Ok(true) => debug!(worker_id = %self.config.worker_id, "processed a job"),
                Ok(false) => {}
                Err(e) => error!(worker_id = %self.config.worker_id, error = %e, "worker tick failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker_id = %self.config.worker_id, "bulk job worker stopped");
        Ok(())
    }

    /// Claim and fully process the oldest queued job, if any.
    ///
    /// Public so tests can drive ticks without real timers. Returns whether
    /// a job was claimed.
    pub async fn run_next_job(&self) -> Result<bool> {
        let Some(job) = BulkJob::claim_next_queued(&self.deps.db_pool).await? else {
            return Ok(false);
        };

        info!(
            job_id = %job.id,
            shop = %job.shop_domain,
            kind = ?job.kind,
            total_items = job.total_items,
            "executing bulk job"
        );

        let outcome = match job.kind {
            JobKind::Products => processors::products::run(&self.deps, &job).await,
            JobKind::Collections => processors::collections::run(&self.deps, &job).await,
            JobKind::AltText => processors::alt_text::run(&self.deps, &job).await,
        };

        match outcome {
            Ok(()) => {
                BulkJob::mark_completed(&self.deps.db_pool, job.id).await?;
                info!(job_id = %job.id, "bulk job completed");
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "bulk job failed");

                // Full refund of the reserved cost, even when some work items
                // partially succeeded before the fatal error.
                let credit_cost = job.config.credit_cost;
                if credit_cost > 0 {
                    if let Err(refund_err) = Shop::refund(
                        &self.deps.db_pool,
                        &job.shop_domain,
                        credit_cost,
                        self.deps.initial_shop_credits,
                    )
                    .await
                    {
                        error!(
                            job_id = %job.id,
                            shop = %job.shop_domain,
                            amount = credit_cost,
                            error = %refund_err,
                            "failed to refund credits for failed job"
                        );
                    }
                }

                if let Err(mark_err) =
                    BulkJob::mark_failed(&self.deps.db_pool, job.id, &e.to_string()).await
                {
                    error!(job_id = %job.id, error = %mark_err, "failed to mark job as failed");
                }
            }
        }

        Ok(true)
    }
}
