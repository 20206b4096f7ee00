//! Ports - 抽象化レイヤー
//!
//! 外部コラボレータ（フィード、通知先）と共有状態（FreshnessCache）、
//! 時刻・ID 生成のインターフェースをここで定義する。
//! 実装は `cache` と `impls` にある。

pub mod clock;
pub mod fetcher;
pub mod freshness_cache;
pub mod id_generator;
pub mod notify_sink;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::fetcher::{FetchError, ItemFetcher};
pub use self::freshness_cache::FreshnessCache;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notify_sink::NotificationSink;
