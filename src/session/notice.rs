//! 画面上部に出す一時メッセージ

use std::time::{Duration, Instant};

/// 履歴再読込・単一削除の通知を出しておく時間
pub const INFO_SHORT: Duration = Duration::from_millis(1500);
/// 全件削除の通知を出しておく時間
pub const INFO_LONG: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// エラーか情報のどちらか1件
///
/// `generation` は発行ごとに単調増加する。期限は通知自身が持つため、
/// 古い通知の期限で新しい通知が消えることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub generation: u64,
    /// None はユーザー操作で消えるまで残る
    pub expires_at: Option<Instant>,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}
