//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定検証とワイヤリング
//! - **StoryEvaluator**: ランクリスト 1 回分の評価（cache 確認 → fetch → resolve）
//! - **EvaluatorLoop**: 評価を evaluation_interval ごとに実行し、通知を配送
//! - **EvictorLoop**: FreshnessCache の期限切れ削除
//! - **SchedulerHandle**: 2 つのループの停止と join

pub mod builder;
pub mod evaluator;
pub mod evaluator_loop;
pub mod evictor_loop;
pub mod retry;
pub mod scheduler;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::evaluator::{PassAborted, StoryEvaluator};
pub use self::evaluator_loop::EvaluatorLoop;
pub use self::evictor_loop::EvictorLoop;
pub use self::retry::RetryPolicy;
pub use self::scheduler::SchedulerHandle;
pub use self::status::{EvictionSummary, Health, PassReport, PassSummary, SchedulerStatus};
