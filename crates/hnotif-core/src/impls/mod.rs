//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HackerNewsFetcher**: Firebase HTTP API からの取得（本番用）
//! - **StdoutSink**: 標準出力への通知（text / JSON lines）
//! - **InMemoryFetcher**: 開発用・テスト用のスクリプト可能なフィード

pub mod hn_http;
pub mod inmem_fetcher;
pub mod stdout_sink;

// 主要な型を再エクスポート
pub use self::hn_http::{DEFAULT_BASE_URL, HackerNewsFetcher};
pub use self::inmem_fetcher::InMemoryFetcher;
pub use self::stdout_sink::{OutputFormat, StdoutSink};
