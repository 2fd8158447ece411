//! 操作セッション
//!
//! `InteractionState`（純粋な状態遷移）と `AnalysisBackend`（通信）をつなぐ。
//! 各ハンドラは完了まで走り切る前提で `&mut self` を取る。

mod notice;
mod preview;
mod state;

pub use notice::{Notice, NoticeKind, INFO_LONG, INFO_SHORT};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use state::{AnalysisRequest, InteractionState, Operation, Phase, ANALYZE_FALLBACK_MESSAGE};

use crate::client::AnalysisBackend;
use crate::config::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use crate::confirm::Confirmation;
use crate::upload::SelectedFile;
use analyzer_common::AnalysisParameters;
use std::time::Instant;
use tracing::info;

const DELETE_PROMPT: &str = "Delete this record and its files?";
const CLEAR_PROMPT: &str = "All history and related files will be deleted. Are you sure?";

/// 処理中フラグを保持するガード
///
/// 正常終了でも、待機中に future が破棄された場合でも、drop 時にフラグを下ろす。
struct InFlight<'a> {
    state: &'a mut InteractionState,
    op: Operation,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a mut InteractionState, op: Operation) -> Self {
        Self { state, op }
    }

    fn state(&mut self) -> &mut InteractionState {
        self.state
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.release(self.op);
    }
}

pub struct Session<B, C> {
    backend: B,
    confirmation: C,
    state: InteractionState,
    history_limit: usize,
}

impl<B: AnalysisBackend, C: Confirmation> Session<B, C> {
    pub fn new(backend: B, confirmation: C, params: AnalysisParameters) -> Self {
        Self {
            backend,
            confirmation,
            state: InteractionState::new(params),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// 取得件数は `1..=MAX_HISTORY_LIMIT` に収める
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        self
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn params_mut(&mut self) -> &mut AnalysisParameters {
        self.state.params_mut()
    }

    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        self.state.select_file(file);
    }

    /// 起動時の履歴読込（失敗は表示しない）
    pub async fn load_history(&mut self) {
        let outcome = self.backend.list_history(self.history_limit).await;
        self.state.apply_background_refresh(outcome);
    }

    /// 解析を送信し、成功したら履歴を裏で再読込する
    pub async fn submit(&mut self) {
        if self.analyze_selected().await {
            let outcome = self.backend.list_history(self.history_limit).await;
            self.state.apply_background_refresh(outcome);
        }
    }

    /// 解析だけを行う（履歴は再読込しない）。成功したら true
    ///
    /// 未選択・解析中なら何も送らず false。
    pub async fn analyze_selected(&mut self) -> bool {
        let Some(request) = self.state.begin_analysis() else {
            return false;
        };
        info!(file = request.file.name(), "submitting analysis");

        let mut guard = InFlight::new(&mut self.state, Operation::Analysis);
        let outcome = self.backend.analyze(&request.file, &request.params).await;
        let ok = outcome.is_ok();
        guard.state().finish_analysis(outcome);
        ok
    }

    pub async fn refresh_history(&mut self) {
        let outcome = self.backend.list_history(self.history_limit).await;
        self.state.finish_refresh(outcome, Instant::now());
    }

    /// 確認後に1件削除する。該当なし・拒否なら何もしない
    pub async fn delete_record(&mut self, id: &str) {
        if !self.state.can_delete(id) {
            return;
        }
        if !self.confirmation.confirm(DELETE_PROMPT) {
            return;
        }
        if !self.state.begin_delete(id) {
            return;
        }
        info!(id, "deleting history record");

        let mut guard = InFlight::new(&mut self.state, Operation::Delete);
        let outcome = self.backend.delete_history_record(id).await;
        guard.state().finish_delete(id, outcome, Instant::now());
    }

    /// 確認後に全件削除する
    pub async fn clear_history(&mut self) {
        if !self.confirmation.confirm(CLEAR_PROMPT) {
            return;
        }
        if !self.state.begin_clear() {
            return;
        }
        info!("clearing history");

        let mut guard = InFlight::new(&mut self.state, Operation::Clear);
        let outcome = self.backend.clear_history().await;
        guard.state().finish_clear(outcome, Instant::now());
    }

    pub fn expire_notices(&mut self) -> bool {
        self.state.expire_notices(Instant::now())
    }
}
