//! ItemFetcher port - ランク付きフィードの取得
//!
//! # 実装
//! - **HackerNewsFetcher**: HTTP（本番用）
//! - **InMemoryFetcher**: スクリプト可能なテスト用

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ErrorKind, Item, ItemId};

/// Errors returned by an `ItemFetcher`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned unexpected status code: {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("item {0} does not exist")]
    NotFound(ItemId),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// 運用分類（リトライ判断に使う）
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport { .. } | FetchError::Timeout(_) | FetchError::Unavailable(_) => {
                ErrorKind::Transient
            }
            FetchError::Status { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::Transient
            }
            FetchError::Status { .. } | FetchError::Decode { .. } | FetchError::NotFound(_) => {
                ErrorKind::Permanent
            }
        }
    }
}

/// ItemFetcher はフィードの外部コラボレータ
///
/// - 引数なし: 現在のランク順 ID リスト
/// - ID 指定: アイテム詳細
///
/// どちらも失敗しうる。タイムアウトは呼び出し側（StoryEvaluator）でも掛ける。
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch_ranked_ids(&self) -> Result<Vec<ItemId>, FetchError>;

    async fn fetch_item(&self, id: ItemId) -> Result<Item, FetchError>;
}
