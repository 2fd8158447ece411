//! クライアント側のドメイン型
//!
//! いずれもサーバー応答から作られた後は変更しない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 検出された物体1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub area: f64,
    /// `[x1, y1, x2, y2]`
    pub bounding_box: Option<[f64; 4]>,
    #[serde(default)]
    pub histogram: Vec<f32>,
}

/// 1回の解析結果
///
/// `detections` はサーバーが返した順序のまま保持する（並べ替えない）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// ベースURLで解決済みの注釈画像URL
    pub annotated_image_url: Option<String>,
    pub detections: Vec<Detection>,
    pub history_id: Option<String>,
    pub message: Option<String>,
}

/// 履歴レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub filename: String,
    /// パースできなかった場合は None（生文字列は `uploaded_at_raw`）
    pub uploaded_at: Option<DateTime<Utc>>,
    pub uploaded_at_raw: String,
    pub objects_count: u32,
    pub labels: BTreeSet<String>,
    pub original_image_url: Option<String>,
    pub annotated_image_url: Option<String>,
}

impl HistoryRecord {
    /// サムネイル・リンク用の画像URL（注釈画像を優先）
    pub fn preferred_image_url(&self) -> Option<&str> {
        self.annotated_image_url
            .as_deref()
            .or(self.original_image_url.as_deref())
    }
}

/// 単一削除の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRecord {
    pub id: String,
}

/// 全件削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearOutcome {
    pub deleted: u64,
}
