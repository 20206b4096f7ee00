//! NotificationSink port - 通知の配送先
//!
//! Fire-and-forget。配送失敗の扱いは sink 自身の責務で、
//! Evaluator にはエラーを返さない。

use async_trait::async_trait;

use crate::domain::Item;

/// NotificationSink は通知対象アイテムを受け取る
///
/// `items` はランク順。空のリストでは呼ばれない。
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, items: &[Item]);
}
