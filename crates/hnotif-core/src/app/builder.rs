//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 設定の不整合や未指定のコラボレータは build() で弾く
//! - 省略可能な部品（Clock, FreshnessCache）はデフォルト実装を使う

use std::sync::Arc;

use tokio::sync::watch;

use crate::app::evaluator::StoryEvaluator;
use crate::app::evaluator_loop::EvaluatorLoop;
use crate::app::evictor_loop::EvictorLoop;
use crate::app::scheduler::SchedulerHandle;
use crate::app::status::{PassReport, SchedulerStatus};
use crate::cache::InMemoryFreshnessCache;
use crate::config::{AppConfig, ConfigError};
use crate::ports::{
    Clock, FreshnessCache, IdGenerator, ItemFetcher, NotificationSink, SystemClock, UlidGenerator,
};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(config)
///     .fetcher(Arc::new(HackerNewsFetcher::new(timeout)?))
///     .sink(Arc::new(StdoutSink::new(OutputFormat::Text)))
///     .build()?;
/// let handle = app.spawn();
/// ```
#[derive(Default)]
pub struct AppBuilder {
    config: AppConfig,
    fetcher: Option<Arc<dyn ItemFetcher>>,
    sink: Option<Arc<dyn NotificationSink>>,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<Arc<dyn FreshnessCache>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no item fetcher configured")]
    MissingFetcher,

    #[error("no notification sink configured")]
    MissingSink,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ItemFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to an empty `InMemoryFreshnessCache`.
    pub fn cache(mut self, cache: Arc<dyn FreshnessCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// # 検証
    /// - AppConfig::validate()
    /// - fetcher / sink が指定されていること
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let fetcher = self.fetcher.ok_or(BuildError::MissingFetcher)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryFreshnessCache::new()));
        let id_gen: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(clock.clone()));
        let (status_tx, _) = watch::channel(SchedulerStatus::default());

        Ok(App {
            config: self.config,
            fetcher,
            sink,
            clock,
            cache,
            id_gen,
            status: Arc::new(status_tx),
        })
    }
}

/// App は検証済みの設定とコラボレータを保持する
///
/// - `spawn()`: 評価ループと削除ループを起動
/// - `run_once()`: 1 パスだけ実行（ループなし）
pub struct App {
    config: AppConfig,
    fetcher: Arc<dyn ItemFetcher>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    cache: Arc<dyn FreshnessCache>,
    id_gen: Arc<dyn IdGenerator>,
    status: Arc<watch::Sender<SchedulerStatus>>,
}

impl App {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn FreshnessCache> {
        &self.cache
    }

    /// Start both loops. Must be called inside a tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let evaluator = self.evaluator_loop();
        let evictor = EvictorLoop {
            cache: self.cache.clone(),
            clock: self.clock.clone(),
            retention: self.config.retention_horizon,
            interval: self.config.eviction_interval,
            status: self.status.clone(),
        };
        SchedulerHandle::spawn(evaluator, evictor, self.status.subscribe())
    }

    /// Run a single evaluation pass and deliver its notifications.
    ///
    /// Returns `None` when the ranked list could not be fetched.
    pub async fn run_once(&self) -> Option<PassReport> {
        // sender を保持しておかないと changed() が即 Err になり、リトライが打ち切られる
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.evaluator_loop().tick(&mut shutdown_rx).await
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    fn evaluator_loop(&self) -> EvaluatorLoop {
        let evaluator = StoryEvaluator::new(self.fetcher.clone(), self.cache.clone())
            .with_failure_policy(self.config.on_fetch_error)
            .with_fetch_timeout(self.config.fetch_timeout);
        EvaluatorLoop {
            evaluator,
            fetcher: self.fetcher.clone(),
            sink: self.sink.clone(),
            clock: self.clock.clone(),
            id_gen: self.id_gen.clone(),
            policy: self.config.policy.clone(),
            interval: self.config.evaluation_interval,
            fetch_timeout: self.config.fetch_timeout,
            ranked_retry: self.config.ranked_retry.clone(),
            status: self.status.clone(),
        }
    }
}
