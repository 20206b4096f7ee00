//! EvaluatorLoop - 評価ループ
//!
//! # フロー（tick ごと）
//! 1. ランクリストを取得（失敗時は RetryPolicy でバックオフ、尽きたら tick をスキップ）
//! 2. PassId を発行して StoryEvaluator::evaluate
//! 3. 通知リストが空でなければ NotificationSink へ
//! 4. SchedulerStatus を更新
//!
//! 開始した tick は shutdown が来ても最後まで走る。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::app::evaluator::{PassAborted, StoryEvaluator};
use crate::app::retry::RetryPolicy;
use crate::app::status::{PassReport, SchedulerStatus};
use crate::domain::{ItemId, Policy};
use crate::ports::{Clock, FetchError, IdGenerator, ItemFetcher, NotificationSink};

pub struct EvaluatorLoop {
    pub(crate) evaluator: StoryEvaluator,
    pub(crate) fetcher: Arc<dyn ItemFetcher>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) id_gen: Arc<dyn IdGenerator>,
    pub(crate) policy: Policy,
    pub(crate) interval: Duration,
    pub(crate) fetch_timeout: Duration,
    pub(crate) ranked_retry: RetryPolicy,
    pub(crate) status: Arc<watch::Sender<SchedulerStatus>>,
}

impl EvaluatorLoop {
    /// Run until `shutdown` flips to true (or its sender is dropped).
    ///
    /// The first tick fires immediately; an overrunning pass delays the next
    /// tick instead of bursting.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, threshold = self.policy.score_threshold, "evaluator loop started");

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
                    // 次のループで判定
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.tick(&mut shutdown).await;
        }

        info!("evaluator loop stopped");
    }

    /// One full tick: fetch ranked list, evaluate, notify.
    ///
    /// Returns `None` when the ranked list could not be fetched.
    pub async fn tick(&self, shutdown: &mut watch::Receiver<bool>) -> Option<PassReport> {
        let ranked = self.fetch_ranked(shutdown).await?;

        let pass_id = self.id_gen.generate_pass_id();
        let now = self.clock.now();
        let (report, aborted) = match self
            .evaluator
            .evaluate(pass_id, &self.policy, &ranked, now)
            .await
        {
            Ok(report) => (report, false),
            Err(PassAborted {
                item_id,
                source,
                partial,
            }) => {
                warn!(%pass_id, %item_id, error = %source, "pass aborted");
                (partial, true)
            }
        };

        // Abort 時も partial.notified はキャッシュ済みなので配送する
        if !report.notified.is_empty() {
            self.sink.notify(&report.notified).await;
        }

        info!(
            %pass_id,
            ranked = report.ranked,
            notified = report.notified.len(),
            already_resolved = report.already_resolved,
            stale = report.stale,
            pending = report.pending,
            failed = report.failed.len(),
            aborted,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pass complete"
        );

        let mut summary = report.summary();
        summary.aborted = aborted;
        self.status.send_modify(|status| status.record_pass(summary));

        Some(report)
    }

    async fn fetch_ranked(&self, shutdown: &mut watch::Receiver<bool>) -> Option<Vec<ItemId>> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.fetch_ranked_once().await {
                Ok(ids) => return Some(ids),
                Err(err) => err,
            };

            if err.kind().is_retryable() && self.ranked_retry.should_retry(attempts) {
                let delay = self.ranked_retry.next_delay(attempts);
                warn!(attempts, ?delay, error = %err, "ranked list fetch failed, retrying");
                // バックオフ中は何も処理中でないので shutdown で即抜けてよい
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => return None,
                }
                continue;
            }

            error!(attempts, error = %err, "ranked list unavailable, skipping tick");
            self.status
                .send_modify(|status| status.record_ranked_failure(err.to_string()));
            return None;
        }
    }

    async fn fetch_ranked_once(&self) -> Result<Vec<ItemId>, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_ranked_ids()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }
}
