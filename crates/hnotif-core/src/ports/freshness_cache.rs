//! FreshnessCache port - 処理済みアイテムの記録
//!
//! エントリがある = 終端判定済み（通知済み or stale）。
//! 再評価・再通知はしない。削除は Evictor の `evict_older_than` だけ。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ItemId;

/// FreshnessCache は Evaluator と Evictor が共有する唯一の可変状態
///
/// # 同期
/// - 実装はすべての操作を内部でロックする
/// - `evict_older_than` は `contains` / `put` と並行に呼ばれてもよい
#[async_trait]
pub trait FreshnessCache: Send + Sync {
    /// `id` のエントリがあれば true
    async fn contains(&self, id: ItemId) -> bool;

    /// 挿入または上書き（冪等）
    async fn put(&self, id: ItemId, posted_at: DateTime<Utc>);

    /// `now - posted_at >= max_age` のエントリをすべて削除し、削除数を返す
    async fn evict_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
