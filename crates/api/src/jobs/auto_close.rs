//! Inactivity auto-close background job.
//!
//! Every run scans open tickets whose newest reply is a staff reply older
//! than the configured threshold and drives each one through the system
//! close transition. The candidate query's predicate is the idempotence
//! guard: a second run finds nothing new to do, and a fresh customer reply
//! disqualifies a ticket without any bookkeeping flag.

use sqlx::PgPool;
use tracing::{info, warn};

use persistence::repositories::TicketRepository;

use crate::middleware::metrics::record_tickets_auto_closed;
use crate::services::TicketLifecycleService;

use super::scheduler::{Job, JobFrequency};

/// Background job that closes tickets abandoned by the customer.
pub struct AutoCloseJob {
    pool: PgPool,
    lifecycle: TicketLifecycleService,
    inactivity_days: i64,
    batch_size: i64,
}

impl AutoCloseJob {
    /// Create a new auto-close job.
    ///
    /// # Arguments
    /// * `pool` - Database connection pool
    /// * `lifecycle` - Transition service used for each close
    /// * `inactivity_days` - Customer silence threshold in days
    /// * `batch_size` - Tickets examined per batch
    pub fn new(
        pool: PgPool,
        lifecycle: TicketLifecycleService,
        inactivity_days: i64,
        batch_size: i64,
    ) -> Self {
        Self {
            pool,
            lifecycle,
            inactivity_days,
            batch_size,
        }
    }

    /// Walk the candidate set in keyset batches and close each ticket.
    ///
    /// A failure on one ticket is logged and skipped; only a failing
    /// candidate query aborts the run (and the next scheduled run retries).
    async fn close_stale_tickets(&self) -> Result<usize, sqlx::Error> {
        let tickets = TicketRepository::new(self.pool.clone());
        let mut closed: usize = 0;
        let mut after_id: i64 = 0;

        loop {
            let candidates = tickets
                .auto_close_candidates(self.inactivity_days, after_id, self.batch_size)
                .await?;

            let batch_len = candidates.len();

            for candidate in &candidates {
                after_id = candidate.id;

                match self.lifecycle.auto_close(candidate).await {
                    Ok(true) => closed += 1,
                    Ok(false) => {
                        // No longer qualifies; the predicate excludes it next run.
                    }
                    Err(e) => {
                        warn!(
                            ticket_id = candidate.id,
                            error = %e,
                            "Failed to auto-close ticket, skipping"
                        );
                    }
                }
            }

            if batch_len < self.batch_size as usize {
                break;
            }

            // Yield between batches so a large backlog doesn't monopolize
            // the worker.
            tokio::task::yield_now().await;
        }

        Ok(closed)
    }
}

#[async_trait::async_trait]
impl Job for AutoCloseJob {
    fn name(&self) -> &'static str {
        "auto_close"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hours(6)
    }

    async fn execute(&self) -> Result<(), String> {
        let closed = self
            .close_stale_tickets()
            .await
            .map_err(|e| format!("Failed to scan auto-close candidates: {}", e))?;

        if closed > 0 {
            record_tickets_auto_closed(closed);
            info!(
                closed = closed,
                inactivity_days = self.inactivity_days,
                "Auto-closed inactive tickets"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use domain::models::reply::ReplySummary;
    use domain::services::engagement;
    use std::time::Duration;

    #[test]
    fn test_job_frequency_is_six_hours() {
        let job_freq = JobFrequency::Hours(6);
        assert_eq!(job_freq.duration(), Duration::from_secs(6 * 3600));
    }

    // The candidate SQL and the per-ticket re-check share one rule; these
    // exercise the classifier side of it on the projections the job sees.

    #[test]
    fn test_stale_staff_reply_still_awaits_customer() {
        let latest = ReplySummary {
            id: 10,
            is_from_admin: true,
            created_at: Utc::now() - ChronoDuration::days(8),
        };
        assert!(engagement::classify_latest(Some(&latest)).awaiting_customer());
    }

    #[test]
    fn test_fresh_customer_reply_disqualifies() {
        // A customer reply after the staff reply wins the "latest" slot,
        // so the re-check refuses to close.
        let history = [
            ReplySummary {
                id: 10,
                is_from_admin: true,
                created_at: Utc::now() - ChronoDuration::days(8),
            },
            ReplySummary {
                id: 11,
                is_from_admin: false,
                created_at: Utc::now() - ChronoDuration::days(2),
            },
        ];
        assert!(!engagement::classify(&history).awaiting_customer());
    }
}
