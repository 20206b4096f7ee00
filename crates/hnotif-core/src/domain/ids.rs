//! Domain identifiers (strongly-typed IDs).
//!
//! - `ItemId`: フィードが振る安定した整数 ID（Hacker News の item id）
//! - `PassId`: 評価パスごとの ULID。ログの相関に使う
//!
//! どちらも newtype なので、素の `u64` と取り違えることはできない。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// フィード上のアイテム ID
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 評価パスの ID
///
/// ULID なので生成順にソートできる。`IdGenerator` 経由で Clock から作る。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(Ulid);

impl PassId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for PassId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_serializes_as_bare_integer() {
        let id = ItemId::new(8863);
        assert_eq!(serde_json::to_string(&id).unwrap(), "8863");

        let ids: Vec<ItemId> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(ids, vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)]);
    }

    #[test]
    fn pass_id_display_has_prefix() {
        let id = PassId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("pass-"));
    }
}
