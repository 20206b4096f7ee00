//! Item - フィードから取得したアイテム
//!
//! ポリシーが見るのは `score` と `posted_at` だけ。
//! それ以外（by, descendants, kids, url, kind）は sink にそのまま渡す。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemId;

/// Hacker News の item レスポンス
///
/// `time` は Unix 秒。コメントや削除済みアイテムは score/title を
/// 持たないことがあるので、ポリシー外のフィールドは default で埋める。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    #[serde(default)]
    pub score: i64,

    #[serde(rename = "time", with = "chrono::serde::ts_seconds")]
    pub posted_at: DateTime<Utc>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub by: String,

    #[serde(default)]
    pub descendants: u32,

    #[serde(default)]
    pub kids: Vec<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Item {
    /// テストや InMemoryFetcher 用の最小構成
    pub fn new(id: ItemId, score: i64, posted_at: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            id,
            score,
            posted_at,
            title: title.into(),
            by: String::new(),
            descendants: 0,
            kids: Vec::new(),
            url: None,
            kind: "story".to_string(),
        }
    }
}
