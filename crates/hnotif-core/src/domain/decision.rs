//! Decision model: what the evaluator does with one freshly fetched item.
//!
//! `Policy::resolve` is a pure function (item + now -> Resolution). The
//! evaluator owns the side effects (cache write, notify list).

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::Item;

/// The outcome of applying the policy to an item that is not yet cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Score reached the threshold: notify and cache.
    Notify,

    /// Below threshold but old enough that the score is assumed final: cache only.
    Stale,

    /// Below threshold and still young: leave unresolved for the next pass.
    Pending,
}

impl Resolution {
    /// Terminal resolutions are written to the freshness cache.
    pub fn is_terminal(self) -> bool {
        matches!(self, Resolution::Notify | Resolution::Stale)
    }
}

/// Notification policy.
///
/// - `score_threshold`: `score >= threshold` で通知
/// - `stale_age`: `now - posted_at >= stale_age` で確定扱い（通知しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub score_threshold: i64,
    pub stale_age: Duration,
}

impl Policy {
    pub fn new(score_threshold: i64, stale_age: Duration) -> Self {
        Self {
            score_threshold,
            stale_age,
        }
    }

    /// Decide the resolution for an item observed at `now`.
    ///
    /// Threshold is checked first, so an old item with a high score is
    /// still notified on its first evaluation.
    pub fn resolve(&self, item: &Item, now: DateTime<Utc>) -> Resolution {
        if item.score >= self.score_threshold {
            return Resolution::Notify;
        }

        // posted_at が未来（時計ずれ）の場合 age は負になり Pending のまま
        let age = now - item.posted_at;
        let stale_age = TimeDelta::from_std(self.stale_age).unwrap_or(TimeDelta::MAX);
        if age >= stale_age {
            Resolution::Stale
        } else {
            Resolution::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn policy() -> Policy {
        Policy::new(100, Duration::from_secs(48 * 3600))
    }

    #[rstest]
    #[case::hot_and_young(150, 1, Resolution::Notify)]
    #[case::hot_and_old(150, 72, Resolution::Notify)]
    #[case::exactly_threshold(100, 1, Resolution::Notify)]
    #[case::cold_and_young(50, 1, Resolution::Pending)]
    #[case::cold_and_old(50, 72, Resolution::Stale)]
    #[case::cold_exactly_stale(99, 48, Resolution::Stale)]
    #[case::cold_just_under_stale(99, 47, Resolution::Pending)]
    fn resolve_cases(#[case] score: i64, #[case] age_hours: i64, #[case] expected: Resolution) {
        let item = Item::new(
            ItemId::new(1),
            score,
            now() - TimeDelta::hours(age_hours),
            "t",
        );
        assert_eq!(policy().resolve(&item, now()), expected);
    }

    #[test]
    fn future_posted_at_stays_pending() {
        let item = Item::new(ItemId::new(1), 10, now() + TimeDelta::hours(1), "t");
        assert_eq!(policy().resolve(&item, now()), Resolution::Pending);
    }

    #[test]
    fn only_notify_and_stale_are_terminal() {
        assert!(Resolution::Notify.is_terminal());
        assert!(Resolution::Stale.is_terminal());
        assert!(!Resolution::Pending.is_terminal());
    }
}
