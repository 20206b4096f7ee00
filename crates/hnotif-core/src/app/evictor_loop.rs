//! EvictorLoop - FreshnessCache の期限切れ削除
//!
//! Evaluator とは独立した周期で `evict_older_than(retention, now)` を呼ぶ。
//! 最初の削除は 1 周期後。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::app::status::{EvictionSummary, SchedulerStatus};
use crate::ports::{Clock, FreshnessCache};

pub struct EvictorLoop {
    pub(crate) cache: Arc<dyn FreshnessCache>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) retention: Duration,
    pub(crate) interval: Duration,
    pub(crate) status: Arc<watch::Sender<SchedulerStatus>>,
}

impl EvictorLoop {
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, retention = ?self.retention, "evictor loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.tick().await;
        }

        info!("evictor loop stopped");
    }

    pub async fn tick(&self) -> EvictionSummary {
        let now = self.clock.now();
        let removed = self.cache.evict_older_than(self.retention, now).await;
        let remaining = self.cache.len().await;

        if removed > 0 {
            info!(evicted = removed, remaining, "eviction complete");
        } else {
            debug!(remaining, "nothing to evict");
        }

        let summary = EvictionSummary {
            at: now,
            removed,
            remaining,
        };
        let recorded = summary.clone();
        self.status
            .send_modify(|status| status.last_eviction = Some(recorded));
        summary
    }
}
