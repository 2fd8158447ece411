//! 操作状態と遷移
//!
//! ネットワークI/Oは一切行わない。非同期処理は `begin_*` で要求を取り出し、
//! 応答が届いたら `finish_*` に結果を渡す2段構成になっている。
//! 応答の到着順に関わらず後勝ちで適用する（古さの判定はしない）。

use super::notice::{Notice, NoticeKind, INFO_LONG, INFO_SHORT};
use super::preview::{PreviewHandle, PreviewRegistry};
use crate::error::AnalyzerError;
use crate::upload::SelectedFile;
use analyzer_common::{AnalysisParameters, AnalysisResult, ClearOutcome, DeletedRecord, HistoryRecord};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const ANALYZE_FALLBACK_MESSAGE: &str = "Analyze failed";

/// 画面の大まかな状態（フラグから導出）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FileSelected,
    Analyzing,
    ResultReady,
    Failed,
}

/// `begin_analysis` が返す送信内容
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub file: SelectedFile,
    pub params: AnalysisParameters,
}

/// 処理中フラグの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analysis,
    Delete,
    Clear,
}

#[derive(Debug, Default)]
pub struct InteractionState {
    params: AnalysisParameters,
    selected: Option<SelectedFile>,
    preview: Option<PreviewHandle>,
    previews: PreviewRegistry,
    result: Option<AnalysisResult>,
    analysis_failed: bool,
    analyzing: bool,
    history: Vec<HistoryRecord>,
    busy_record_id: Option<String>,
    clearing: bool,
    notice: Option<Notice>,
    generation: u64,
}

impl InteractionState {
    pub fn new(params: AnalysisParameters) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    // --- 読み取り ---

    pub fn phase(&self) -> Phase {
        if self.analyzing {
            Phase::Analyzing
        } else if self.result.is_some() {
            Phase::ResultReady
        } else if self.analysis_failed {
            Phase::Failed
        } else if self.selected.is_some() {
            Phase::FileSelected
        } else {
            Phase::Idle
        }
    }

    pub fn params(&self) -> &AnalysisParameters {
        &self.params
    }

    /// 値はセッターでクランプされる
    pub fn params_mut(&mut self) -> &mut AnalysisParameters {
        &mut self.params
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn busy_record_id(&self) -> Option<&str> {
        self.busy_record_id.as_deref()
    }

    pub fn is_clearing(&self) -> bool {
        self.clearing
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.kind == NoticeKind::Error)
            .map(|n| n.text.as_str())
    }

    pub fn info_message(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.kind == NoticeKind::Info)
            .map(|n| n.text.as_str())
    }

    // --- ファイル選択 ---

    /// ファイルを選択・置換する。`None` で選択解除
    ///
    /// 旧プレビューは新しいものを作る前に必ず解放する。
    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        if let Some(old) = self.preview.take() {
            self.previews.revoke(old);
        }
        self.preview = file.as_ref().map(|f| self.previews.create(f));
        debug!(file = file.as_ref().map(|f| f.name()), "file selected");

        self.selected = file;
        self.result = None;
        self.analysis_failed = false;
        self.notice = None;
    }

    // --- 解析 ---

    /// ファイル未選択・解析中なら None（何もしない）
    pub fn begin_analysis(&mut self) -> Option<AnalysisRequest> {
        if self.analyzing {
            return None;
        }
        let file = self.selected.clone()?;
        self.analyzing = true;
        self.analysis_failed = false;
        self.notice = None;
        debug!(file = file.name(), "analysis started");
        Some(AnalysisRequest {
            file,
            params: self.params,
        })
    }

    pub fn finish_analysis(&mut self, outcome: Result<AnalysisResult, AnalyzerError>) {
        self.analyzing = false;
        match outcome {
            Ok(result) => {
                debug!(detections = result.detections.len(), "analysis finished");
                self.result = Some(result);
                self.analysis_failed = false;
            }
            Err(err) => {
                self.result = None;
                self.analysis_failed = true;
                self.set_error(err.user_message(ANALYZE_FALLBACK_MESSAGE));
            }
        }
    }

    // --- 履歴 ---

    /// 自動再読込の結果を反映する。失敗はログのみでユーザーには出さない
    pub fn apply_background_refresh(&mut self, outcome: Result<Vec<HistoryRecord>, AnalyzerError>) {
        match outcome {
            Ok(records) => self.history = records,
            Err(err) => warn!(error = %err, "background history refresh failed"),
        }
    }

    /// ユーザー操作による再読込の結果
    pub fn finish_refresh(&mut self, outcome: Result<Vec<HistoryRecord>, AnalyzerError>, now: Instant) {
        match outcome {
            Ok(records) => {
                self.history = records;
                self.set_info("History refreshed.", INFO_SHORT, now);
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    /// 削除できるID か（空でない・ローカルに存在・削除中でない）
    pub fn can_delete(&self, id: &str) -> bool {
        !id.trim().is_empty()
            && self.busy_record_id.as_deref() != Some(id)
            && self.history.iter().any(|r| r.id == id)
    }

    pub fn begin_delete(&mut self, id: &str) -> bool {
        if !self.can_delete(id) {
            return false;
        }
        self.busy_record_id = Some(id.to_string());
        self.notice = None;
        true
    }

    /// 成功したら応答を待たずにローカルのリストから外す
    pub fn finish_delete(
        &mut self,
        id: &str,
        outcome: Result<DeletedRecord, AnalyzerError>,
        now: Instant,
    ) {
        self.busy_record_id = None;
        match outcome {
            Ok(_) => {
                self.history.retain(|r| r.id != id);
                self.set_info("Record deleted.", INFO_SHORT, now);
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    pub fn begin_clear(&mut self) -> bool {
        if self.clearing {
            return false;
        }
        self.clearing = true;
        self.notice = None;
        true
    }

    pub fn finish_clear(&mut self, outcome: Result<ClearOutcome, AnalyzerError>, now: Instant) {
        self.clearing = false;
        match outcome {
            Ok(cleared) => {
                self.history.clear();
                self.set_info(
                    format!("Cleared. Deleted records: {}", cleared.deleted),
                    INFO_LONG,
                    now,
                );
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    /// 処理中フラグを下ろす。完了・中断のどちらでも呼ばれる
    pub fn release(&mut self, op: Operation) {
        match op {
            Operation::Analysis => self.analyzing = false,
            Operation::Delete => self.busy_record_id = None,
            Operation::Clear => self.clearing = false,
        }
    }

    // --- 通知 ---

    /// 期限切れの通知を消す。消えたら true
    pub fn expire_notices(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
            return true;
        }
        false
    }

    fn set_error(&mut self, text: String) {
        debug!(%text, "error notice");
        self.push_notice(NoticeKind::Error, text, None);
    }

    fn set_info(&mut self, text: impl Into<String>, ttl: Duration, now: Instant) {
        self.push_notice(NoticeKind::Info, text.into(), Some(now + ttl));
    }

    fn push_notice(&mut self, kind: NoticeKind, text: String, expires_at: Option<Instant>) {
        self.generation += 1;
        self.notice = Some(Notice {
            kind,
            text,
            generation: self.generation,
            expires_at,
        });
    }
}
