//! hnotif-core
//!
//! Core building blocks for the hnotif story notifier.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, decision, errors）
//! - **ports**: 抽象化レイヤー（ItemFetcher, NotificationSink, FreshnessCache, Clock, IdGenerator）
//! - **cache**: FreshnessCache の実装（InMemoryFreshnessCache）
//! - **config**: AppConfig と起動時検証
//! - **app**: アプリケーションロジック（builder, evaluator, evaluator_loop, evictor_loop, scheduler）
//! - **impls**: 実装（HackerNewsFetcher, StdoutSink, 開発用の InMemoryFetcher）

pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
