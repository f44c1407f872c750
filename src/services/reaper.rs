//! Periodic sweep that cancels unpaid reservations past the hold window.
//!
//! Seat availability never depends on this task: an expired unpaid
//! reservation already stops blocking its seats at read time. The sweep only
//! moves such reservations to `cancelled` so their status tells the truth.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::database::Database;
use crate::error::AppError;
use crate::models::reservation::hold_since;
use crate::repository::reservation;

#[derive(Clone)]
pub struct HoldReaper {
    db: Database,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReaperStats {
    pub cancelled: Vec<i64>,
}

impl ReaperStats {
    pub fn total(&self) -> usize {
        self.cancelled.len()
    }
}

impl HoldReaper {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Cancels every unpaid reservation that no longer holds its seats at `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<ReaperStats, AppError> {
        let mut tx = self.db.begin().await?;
        let cancelled = reservation::cancel_stale(&mut tx, hold_since(now)).await?;
        tx.commit().await?;

        Ok(ReaperStats { cancelled })
    }

    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match self.sweep(Utc::now()).await {
                    Ok(stats) if stats.total() > 0 => {
                        info!(cancelled = stats.total(), ids = ?stats.cancelled, "stale unpaid reservations cancelled");
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "hold reaper sweep failed"),
                }
            }
        })
    }
}
