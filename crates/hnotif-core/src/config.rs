//! Config - スケジューラが消費する設定
//!
//! デフォルト値はリファレンス値:
//! threshold=100, stale_age=48h, retention=5d, 評価 10s ごと, 削除 8h ごと。
//! `validate()` は AppBuilder::build() から呼ばれる（Fail-fast）。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::RetryPolicy;
use crate::domain::Policy;

const HOUR: Duration = Duration::from_secs(3600);

/// Upper bound for intervals and timeouts; tokio deadlines are `Instant + Duration`.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 3600);

/// 個別アイテムの取得に失敗したときの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailurePolicy {
    /// パスを中断し、以降の ID は評価しない
    Abort,

    /// 失敗を記録して次の ID に進む（未解決のまま残る）
    #[default]
    Skip,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "retention horizon ({retention:?}) must be longer than stale age ({stale_age:?}); \
         otherwise unresolved items could be evicted early"
    )]
    RetentionNotAfterStale {
        retention: Duration,
        stale_age: Duration,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{name} must not exceed {max:?}")]
    DurationTooLong { name: &'static str, max: Duration },

    #[error("ranked-list retry needs at least one attempt")]
    ZeroAttempts,

    #[error("retry multiplier must be finite and >= 1.0, got {0}")]
    InvalidMultiplier(String),
}

/// AppConfig はアプリケーション全体の設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub policy: Policy,

    /// posted_at からこの時間を超えたエントリは Evictor が削除する
    pub retention_horizon: Duration,

    pub evaluation_interval: Duration,

    pub eviction_interval: Duration,

    /// `fetch_item` 1 回あたりの上限
    pub fetch_timeout: Duration,

    pub on_fetch_error: FetchFailurePolicy,

    pub ranked_retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: Policy::new(100, 48 * HOUR),
            retention_horizon: 5 * 24 * HOUR,
            evaluation_interval: Duration::from_secs(10),
            eviction_interval: 8 * HOUR,
            fetch_timeout: Duration::from_secs(10),
            on_fetch_error: FetchFailurePolicy::default(),
            ranked_retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_horizon <= self.policy.stale_age {
            return Err(ConfigError::RetentionNotAfterStale {
                retention: self.retention_horizon,
                stale_age: self.policy.stale_age,
            });
        }

        for (name, value) in [
            ("evaluation interval", self.evaluation_interval),
            ("eviction interval", self.eviction_interval),
            ("fetch timeout", self.fetch_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
            if value > MAX_INTERVAL {
                return Err(ConfigError::DurationTooLong {
                    name,
                    max: MAX_INTERVAL,
                });
            }
        }

        if self.ranked_retry.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        let multiplier = self.ranked_retry.multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier.to_string()));
        }

        Ok(())
    }
}
