//! IdGenerator port - パス ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース

use ulid::Ulid;

use crate::domain::PassId;
use crate::ports::Clock;

/// IdGenerator は評価パスの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（スケジューラのタスクから使う）
pub trait IdGenerator: Send + Sync {
    fn generate_pass_id(&self) -> PassId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock の時刻を timestamp 部分に使うので、FixedClock を渡せば
/// timestamp 部分が決定的になる。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_pass_id(&self) -> PassId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        PassId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
