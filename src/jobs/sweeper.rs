//! Expiry sweeper: scheduled job that fails and reaps stale pending
//! transactions.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use tracing::{error, info};

use crate::ports::TransactionRepository;

/// Two-phase sweep on a cron schedule. Phase 1 marks expired pending
/// transactions `fail`; phase 2 tombstones failed expired ones. A phase
/// error abandons the run; the next run catches anything missed.
pub struct ExpirySweeper {
    repo: Arc<dyn TransactionRepository>,
    schedule: Schedule,
}

impl ExpirySweeper {
    pub fn new(repo: Arc<dyn TransactionRepository>, schedule_expr: &str) -> anyhow::Result<Self> {
        let schedule = Schedule::from_str(schedule_expr)
            .map_err(|e| anyhow::anyhow!("invalid sweeper schedule '{}': {}", schedule_expr, e))?;

        Ok(Self { repo, schedule })
    }

    /// Starts the sweep loop. Runs are sequential on one task, so a sweep
    /// can never overlap itself.
    pub fn start(self) {
        tokio::spawn(async move {
            loop {
                let Some(next) = self.schedule.upcoming(Utc).next() else {
                    error!("sweeper schedule yields no upcoming runs, stopping");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;
                self.run_once().await;
            }
        });
    }

    /// One sweep at the current time. The status+expiry predicates keep
    /// the bulk updates away from rows settled by in-flight requests.
    pub async fn run_once(&self) {
        let now = Utc::now();

        let marked = match self.repo.mark_expired_failed(now).await {
            Ok(n) => n,
            Err(e) => {
                error!("sweep: failed to mark expired transactions: {}", e);
                return;
            }
        };
        if marked > 0 {
            info!("{} expired transactions marked as 'fail'", marked);
        }

        match self.repo.reap_expired_failed(now).await {
            Ok(reaped) if reaped > 0 => {
                info!("{} failed expired transactions soft-deleted", reaped)
            }
            Ok(_) => {}
            Err(e) => error!("sweep: failed to reap expired transactions: {}", e),
        }
    }
}
