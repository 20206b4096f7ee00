//! Status - パス結果とスケジューラの状態
//!
//! - `PassReport`: 評価パス 1 回分の結果（ログ・テスト用）
//! - `SchedulerStatus`: 両ループが `watch` 経由で更新するスナップショット

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Item, ItemId, PassId};

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass_id: PassId,
    pub started_at: DateTime<Utc>,

    /// Length of the ranked list given to the pass.
    pub ranked: usize,

    /// Items to notify, in ranked order.
    pub notified: Vec<Item>,

    /// Skipped because the cache already had them (no fetch).
    pub already_resolved: usize,

    /// Cached without notifying.
    pub stale: usize,

    /// Left unresolved for a later pass.
    pub pending: usize,

    /// Fetch failed (Skip policy), left unresolved.
    pub failed: Vec<ItemId>,

    pub elapsed: Duration,
}

impl PassReport {
    pub fn new(pass_id: PassId, started_at: DateTime<Utc>, ranked: usize) -> Self {
        Self {
            pass_id,
            started_at,
            ranked,
            notified: Vec::new(),
            already_resolved: 0,
            stale: 0,
            pending: 0,
            failed: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn summary(&self) -> PassSummary {
        PassSummary {
            pass_id: self.pass_id,
            started_at: self.started_at,
            ranked: self.ranked,
            notified: self.notified.len(),
            already_resolved: self.already_resolved,
            stale: self.stale,
            pending: self.pending,
            failed: self.failed.len(),
            aborted: false,
        }
    }
}

/// Counts-only view of a pass, kept in `SchedulerStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub pass_id: PassId,
    pub started_at: DateTime<Utc>,
    pub ranked: usize,
    pub notified: usize,
    pub already_resolved: usize,
    pub stale: usize,
    pub pending: usize,
    pub failed: usize,
    pub aborted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Health {
    #[default]
    Healthy,

    /// The ranked list could not be fetched on the last N ticks.
    Degraded {
        consecutive_failures: u32,
        last_error: String,
    },
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionSummary {
    pub at: DateTime<Utc>,
    pub removed: usize,
    pub remaining: usize,
}

/// Snapshot shared by the evaluator and evictor loops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub health: Health,
    pub passes: u64,
    pub notified_total: u64,
    pub last_pass: Option<PassSummary>,
    pub last_eviction: Option<EvictionSummary>,
}

impl SchedulerStatus {
    pub(crate) fn record_pass(&mut self, summary: PassSummary) {
        self.passes += 1;
        self.notified_total += summary.notified as u64;
        self.last_pass = Some(summary);
        self.health = Health::Healthy;
    }

    pub(crate) fn record_ranked_failure(&mut self, error: String) {
        let consecutive_failures = match &self.health {
            Health::Healthy => 1,
            Health::Degraded {
                consecutive_failures,
                ..
            } => consecutive_failures.saturating_add(1),
        };
        self.health = Health::Degraded {
            consecutive_failures,
            last_error: error,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn summary(notified: usize) -> PassSummary {
        let mut report = PassReport::new(PassId::from_ulid(Ulid::new()), Utc::now(), 3);
        report.pending = 3 - notified;
        let mut s = report.summary();
        s.notified = notified;
        s
    }

    #[test]
    fn ranked_failures_accumulate_until_next_pass() {
        let mut status = SchedulerStatus::default();
        assert!(status.health.is_healthy());

        status.record_ranked_failure("boom".to_string());
        status.record_ranked_failure("boom again".to_string());
        assert_eq!(
            status.health,
            Health::Degraded {
                consecutive_failures: 2,
                last_error: "boom again".to_string(),
            }
        );

        status.record_pass(summary(1));
        assert!(status.health.is_healthy());
        assert_eq!(status.passes, 1);
        assert_eq!(status.notified_total, 1);
    }

    #[test]
    fn health_serializes_with_state_tag() {
        let degraded = Health::Degraded {
            consecutive_failures: 3,
            last_error: "timeout".to_string(),
        };
        let json = serde_json::to_value(&degraded).unwrap();
        assert_eq!(json["state"], "degraded");
        assert_eq!(json["consecutive_failures"], 3);
    }
}
