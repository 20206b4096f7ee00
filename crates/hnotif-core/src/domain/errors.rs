//! Errors - エラーの運用分類
//!
//! リトライするかどうかは ErrorKind で決める。

/// ErrorKind は取得エラーの分類
///
/// - Transient: 一時的なエラー（リトライ推奨）
/// - Permanent: 恒久的なエラー（リトライ無意味）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        self == ErrorKind::Transient
    }
}
