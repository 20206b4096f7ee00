//! InMemoryFetcher - スクリプト可能な開発用フィード
//!
//! # 学習ポイント
//! - ロックは await を跨がない（遅延は lock の外で sleep）
//! - 失敗は ID ごと / ランクリスト取得ごとに仕込める
//! - 取得回数を数えて「キャッシュ済みは再取得しない」を検証できる

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Item, ItemId};
use crate::ports::{FetchError, ItemFetcher};

#[derive(Debug, Default)]
struct FetcherState {
    ranked: Vec<ItemId>,
    items: HashMap<ItemId, Item>,
    failing_items: HashSet<ItemId>,
    /// 次回以降のランクリスト取得で順に返すエラー
    ranked_failures: VecDeque<FetchError>,
    item_delay: Option<Duration>,
    item_fetches: HashMap<ItemId, usize>,
    ranked_fetches: usize,
}

/// InMemoryFetcher は ItemFetcher のインメモリ実装
///
/// # 使用例
/// ```ignore
/// let fetcher = InMemoryFetcher::new();
/// fetcher.set_ranked([1, 2, 3].map(ItemId::new));
/// fetcher.put_item(item);
/// fetcher.fail_item(ItemId::new(2));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    state: Mutex<FetcherState>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FetcherState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_ranked(&self, ids: impl IntoIterator<Item = ItemId>) {
        self.state().ranked = ids.into_iter().collect();
    }

    /// 挿入または上書き（スコア更新のシミュレーション）
    pub fn put_item(&self, item: Item) {
        self.state().items.insert(item.id, item);
    }

    pub fn fail_item(&self, id: ItemId) {
        self.state().failing_items.insert(id);
    }

    pub fn recover_item(&self, id: ItemId) {
        self.state().failing_items.remove(&id);
    }

    /// 次のランクリスト取得を `error` で失敗させる（呼ぶたびに 1 回分積む）
    pub fn push_ranked_failure(&self, error: FetchError) {
        self.state().ranked_failures.push_back(error);
    }

    /// fetch_item の応答を遅らせる（タイムアウト検証用）
    pub fn set_item_delay(&self, delay: Option<Duration>) {
        self.state().item_delay = delay;
    }

    pub fn item_fetches(&self, id: ItemId) -> usize {
        self.state().item_fetches.get(&id).copied().unwrap_or(0)
    }

    pub fn ranked_fetches(&self) -> usize {
        self.state().ranked_fetches
    }
}

#[async_trait]
impl ItemFetcher for InMemoryFetcher {
    async fn fetch_ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        let mut state = self.state();
        state.ranked_fetches += 1;
        if let Some(error) = state.ranked_failures.pop_front() {
            return Err(error);
        }
        Ok(state.ranked.clone())
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Item, FetchError> {
        let (delay, result) = {
            let mut state = self.state();
            *state.item_fetches.entry(id).or_default() += 1;

            let result = if state.failing_items.contains(&id) {
                Err(FetchError::Unavailable(format!("scripted failure for item {id}")))
            } else {
                state.items.get(&id).cloned().ok_or(FetchError::NotFound(id))
            };
            (state.item_delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
