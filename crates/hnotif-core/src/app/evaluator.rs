//! StoryEvaluator - ランクリスト 1 回分の評価
//!
//! # フロー（ID ごと、ランク順に逐次）
//! 1. FreshnessCache にあればスキップ（取得もしない）
//! 2. ItemFetcher で詳細取得（タイムアウト付き）。失敗時は FetchFailurePolicy に従う
//! 3. `Policy::resolve` で Notify / Stale / Pending を決める
//! 4. Notify なら通知リストに追加して cache に put、Stale なら put のみ

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::status::PassReport;
use crate::config::FetchFailurePolicy;
use crate::domain::{Item, ItemId, PassId, Policy, Resolution};
use crate::ports::{FetchError, FreshnessCache, ItemFetcher};

/// A pass stopped early under `FetchFailurePolicy::Abort`.
///
/// `partial` holds everything resolved before the failing ID. Items in
/// `partial.notified` are already cached, so the caller must still deliver them.
#[derive(Debug, Error)]
#[error("pass aborted at item {item_id}")]
pub struct PassAborted {
    pub item_id: ItemId,
    #[source]
    pub source: FetchError,
    pub partial: PassReport,
}

/// StoryEvaluator は cache と fetcher を借りて通知リストを作る
pub struct StoryEvaluator {
    fetcher: Arc<dyn ItemFetcher>,
    cache: Arc<dyn FreshnessCache>,
    on_fetch_error: FetchFailurePolicy,
    fetch_timeout: Duration,
}

impl StoryEvaluator {
    pub fn new(fetcher: Arc<dyn ItemFetcher>, cache: Arc<dyn FreshnessCache>) -> Self {
        Self {
            fetcher,
            cache,
            on_fetch_error: FetchFailurePolicy::default(),
            fetch_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_failure_policy(mut self, on_fetch_error: FetchFailurePolicy) -> Self {
        self.on_fetch_error = on_fetch_error;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Evaluate `ranked_ids` in order and return the items to notify.
    ///
    /// Each terminal item is written to the cache exactly once; a later pass
    /// over the same ID stops at the cache check and never fetches it again.
    #[tracing::instrument(name = "evaluate", skip_all, fields(pass_id = %pass_id, ranked = ranked_ids.len()))]
    pub async fn evaluate(
        &self,
        pass_id: PassId,
        policy: &Policy,
        ranked_ids: &[ItemId],
        now: DateTime<Utc>,
    ) -> Result<PassReport, PassAborted> {
        let started = Instant::now();
        let mut report = PassReport::new(pass_id, now, ranked_ids.len());

        for &id in ranked_ids {
            if self.cache.contains(id).await {
                debug!(item_id = %id, "already resolved");
                report.already_resolved += 1;
                continue;
            }

            let item = match self.fetch(id).await {
                Ok(item) => item,
                Err(source) => match self.on_fetch_error {
                    FetchFailurePolicy::Abort => {
                        warn!(item_id = %id, error = %source, "fetch failed, aborting pass");
                        report.elapsed = started.elapsed();
                        return Err(PassAborted {
                            item_id: id,
                            source,
                            partial: report,
                        });
                    }
                    FetchFailurePolicy::Skip => {
                        warn!(item_id = %id, error = %source, "fetch failed, skipping item");
                        report.failed.push(id);
                        continue;
                    }
                },
            };

            self.apply(policy.resolve(&item, now), item, &mut report)
                .await;
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    async fn apply(&self, resolution: Resolution, item: Item, report: &mut PassReport) {
        if resolution.is_terminal() {
            self.cache.put(item.id, item.posted_at).await;
        }
        match resolution {
            Resolution::Notify => {
                debug!(item_id = %item.id, score = item.score, "over threshold, notifying");
                report.notified.push(item);
            }
            Resolution::Stale => {
                debug!(item_id = %item.id, posted_at = %item.posted_at, "stale, caching without notifying");
                report.stale += 1;
            }
            Resolution::Pending => {
                debug!(item_id = %item.id, score = item.score, "below threshold, re-check next pass");
                report.pending += 1;
            }
        }
    }

    async fn fetch(&self, id: ItemId) -> Result<Item, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_item(id)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryFreshnessCache;
    use crate::impls::InMemoryFetcher;
    use chrono::{TimeDelta, TimeZone};
    use ulid::Ulid;

    const HOUR: Duration = Duration::from_secs(3600);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn policy() -> Policy {
        Policy::new(100, 48 * HOUR)
    }

    fn pass() -> PassId {
        PassId::from_ulid(Ulid::new())
    }

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn item(id: u64, score: i64, age_hours: i64) -> Item {
        Item::new(
            ItemId::new(id),
            score,
            now() - TimeDelta::hours(age_hours),
            format!("story {id}"),
        )
    }

    struct Fixture {
        fetcher: Arc<InMemoryFetcher>,
        cache: Arc<InMemoryFreshnessCache>,
    }

    impl Fixture {
        fn new(items: impl IntoIterator<Item = Item>) -> Self {
            let fetcher = Arc::new(InMemoryFetcher::new());
            for item in items {
                fetcher.put_item(item);
            }
            Self {
                fetcher,
                cache: Arc::new(InMemoryFreshnessCache::new()),
            }
        }

        fn evaluator(&self) -> StoryEvaluator {
            StoryEvaluator::new(self.fetcher.clone(), self.cache.clone())
        }
    }

    fn notified_ids(report: &PassReport) -> Vec<ItemId> {
        report.notified.iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn notify_pending_and_stale_on_first_then_nothing_on_second_pass() {
        let fx = Fixture::new([item(1, 150, 1), item(2, 50, 1), item(3, 50, 72)]);
        let evaluator = fx.evaluator();
        let ranked = ids(&[1, 2, 3]);

        let first = evaluator
            .evaluate(pass(), &policy(), &ranked, now())
            .await
            .unwrap();
        assert_eq!(notified_ids(&first), ids(&[1]));
        assert_eq!(first.pending, 1);
        assert_eq!(first.stale, 1);
        assert!(fx.cache.contains(ItemId::new(1)).await);
        assert!(!fx.cache.contains(ItemId::new(2)).await);
        assert!(fx.cache.contains(ItemId::new(3)).await);

        let second = evaluator
            .evaluate(pass(), &policy(), &ranked, now())
            .await
            .unwrap();
        assert!(second.notified.is_empty());
        assert_eq!(second.already_resolved, 2);
        assert_eq!(second.pending, 1);

        // 2 だけ再取得される
        assert_eq!(fx.fetcher.item_fetches(ItemId::new(1)), 1);
        assert_eq!(fx.fetcher.item_fetches(ItemId::new(2)), 2);
        assert_eq!(fx.fetcher.item_fetches(ItemId::new(3)), 1);
    }

    #[tokio::test]
    async fn cached_entry_records_posted_at() {
        let hot = item(1, 500, 5);
        let fx = Fixture::new([hot.clone()]);

        fx.evaluator()
            .evaluate(pass(), &policy(), &ids(&[1]), now())
            .await
            .unwrap();

        assert_eq!(fx.cache.get(ItemId::new(1)).await, Some(hot.posted_at));
    }

    #[tokio::test]
    async fn notify_list_preserves_ranked_order() {
        let fx = Fixture::new([
            item(7, 300, 1),
            item(3, 20, 1),
            item(9, 120, 2),
            item(1, 100, 60),
        ]);

        let report = fx
            .evaluator()
            .evaluate(pass(), &policy(), &ids(&[7, 3, 9, 1]), now())
            .await
            .unwrap();

        assert_eq!(notified_ids(&report), ids(&[7, 9, 1]));
    }

    #[tokio::test]
    async fn pending_item_is_notified_once_it_crosses_threshold() {
        let fx = Fixture::new([item(2, 50, 1)]);
        let evaluator = fx.evaluator();

        let first = evaluator
            .evaluate(pass(), &policy(), &ids(&[2]), now())
            .await
            .unwrap();
        assert!(first.notified.is_empty());

        fx.fetcher.put_item(item(2, 180, 2));
        let second = evaluator
            .evaluate(pass(), &policy(), &ids(&[2]), now())
            .await
            .unwrap();
        assert_eq!(notified_ids(&second), ids(&[2]));

        let third = evaluator
            .evaluate(pass(), &policy(), &ids(&[2]), now())
            .await
            .unwrap();
        assert!(third.notified.is_empty());
        assert_eq!(third.already_resolved, 1);
    }

    #[tokio::test]
    async fn pending_item_becomes_stale_as_time_passes() {
        let fx = Fixture::new([item(2, 50, 1)]);
        let evaluator = fx.evaluator();

        evaluator
            .evaluate(pass(), &policy(), &ids(&[2]), now())
            .await
            .unwrap();
        assert!(!fx.cache.contains(ItemId::new(2)).await);

        let later = now() + TimeDelta::hours(47);
        let report = evaluator
            .evaluate(pass(), &policy(), &ids(&[2]), later)
            .await
            .unwrap();
        assert_eq!(report.stale, 1);
        assert!(report.notified.is_empty());
        assert!(fx.cache.contains(ItemId::new(2)).await);
    }

    #[tokio::test]
    async fn abort_policy_stops_at_failing_item() {
        let fx = Fixture::new([item(4, 200, 1), item(5, 200, 1), item(6, 200, 1)]);
        fx.fetcher.fail_item(ItemId::new(5));
        let evaluator = fx.evaluator().with_failure_policy(FetchFailurePolicy::Abort);

        let err = evaluator
            .evaluate(pass(), &policy(), &ids(&[4, 5, 6]), now())
            .await
            .unwrap_err();

        assert_eq!(err.item_id, ItemId::new(5));
        assert!(matches!(err.source, FetchError::Unavailable(_)));
        // 失敗前のものは partial に残り、以降は評価されない
        assert_eq!(notified_ids(&err.partial), ids(&[4]));
        assert_eq!(fx.fetcher.item_fetches(ItemId::new(6)), 0);
        assert!(!fx.cache.contains(ItemId::new(6)).await);
    }

    #[tokio::test]
    async fn skip_policy_continues_past_failing_item() {
        let fx = Fixture::new([item(4, 200, 1), item(5, 200, 1), item(6, 200, 1)]);
        fx.fetcher.fail_item(ItemId::new(5));

        let report = fx
            .evaluator()
            .evaluate(pass(), &policy(), &ids(&[4, 5, 6]), now())
            .await
            .unwrap();

        assert_eq!(notified_ids(&report), ids(&[4, 6]));
        assert_eq!(report.failed, ids(&[5]));
        assert!(!fx.cache.contains(ItemId::new(5)).await);

        // 復旧すれば次のパスで通知される
        fx.fetcher.recover_item(ItemId::new(5));
        let next = fx
            .evaluator()
            .evaluate(pass(), &policy(), &ids(&[4, 5, 6]), now())
            .await
            .unwrap();
        assert_eq!(notified_ids(&next), ids(&[5]));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let fx = Fixture::new([item(1, 200, 1), item(2, 200, 1)]);
        fx.fetcher.set_item_delay(Some(Duration::from_secs(30)));
        let evaluator = fx
            .evaluator()
            .with_failure_policy(FetchFailurePolicy::Abort)
            .with_fetch_timeout(Duration::from_secs(5));

        let err = evaluator
            .evaluate(pass(), &policy(), &ids(&[1, 2]), now())
            .await
            .unwrap_err();

        assert_eq!(err.item_id, ItemId::new(1));
        assert!(matches!(err.source, FetchError::Timeout(t) if t == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn duplicate_ids_in_one_list_notify_once() {
        let fx = Fixture::new([item(1, 200, 1)]);

        let report = fx
            .evaluator()
            .evaluate(pass(), &policy(), &ids(&[1, 1]), now())
            .await
            .unwrap();

        assert_eq!(notified_ids(&report), ids(&[1]));
        assert_eq!(report.already_resolved, 1);
        assert_eq!(fx.fetcher.item_fetches(ItemId::new(1)), 1);
    }

    #[tokio::test]
    async fn empty_ranked_list_is_a_no_op() {
        let fx = Fixture::new(Vec::new());

        let report = fx
            .evaluator()
            .evaluate(pass(), &policy(), &[], now())
            .await
            .unwrap();

        assert_eq!(report.ranked, 0);
        assert!(report.notified.is_empty());
        assert!(fx.cache.is_empty().await);
    }
}
