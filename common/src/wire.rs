//! バックエンドのJSON形式
//!
//! 応答は寛容に読む。欠けた配列は空、欠けた任意フィールドは None として扱い、
//! 画像パスはここでベースURLを前置して絶対URLにする。

use crate::types::{AnalysisResult, ClearOutcome, DeletedRecord, Detection, HistoryRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /api/v1/analyze` の応答
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub objects: Option<Vec<ObjectInfo>>,
    #[serde(default)]
    pub annotated_url: Option<String>,
    #[serde(default)]
    pub history_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectInfo {
    pub label: String,
    pub confidence: f32,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub histogram: Vec<f32>,
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
}

/// `GET /api/v1/history` の応答
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryListResponse {
    #[serde(default)]
    pub items: Option<Vec<HistoryItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub annotated_url: Option<String>,
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default)]
    pub objects_count: u32,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// `GET /api/v1/debug/version`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerVersion {
    #[serde(default)]
    pub python: String,
    pub fastapi: Option<String>,
    pub uvicorn: Option<String>,
    pub numpy: Option<String>,
    pub opencv: Option<String>,
    pub torch: Option<String>,
    pub ultralytics: Option<String>,
    #[serde(default)]
    pub platform: String,
}

/// `GET /api/v1/debug/config`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub detector: String,
    #[serde(default)]
    pub model_weights: String,
    #[serde(default)]
    pub upload_dir: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// サーバーが返す相対パスをベースURL配下の絶対URLにする
///
/// 既に `http://` / `https://` で始まる値はそのまま返す。
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn resolve_optional(base_url: &str, path: Option<String>) -> Option<String> {
    path.filter(|p| !p.trim().is_empty())
        .map(|p| resolve_url(base_url, &p))
}

impl From<ObjectInfo> for Detection {
    fn from(o: ObjectInfo) -> Self {
        Detection {
            label: o.label,
            confidence: o.confidence,
            area: o.area,
            bounding_box: o.bbox,
            histogram: o.histogram,
        }
    }
}

impl AnalyzeResponse {
    pub fn into_result(self, base_url: &str) -> AnalysisResult {
        AnalysisResult {
            annotated_image_url: resolve_optional(base_url, self.annotated_url),
            detections: self
                .objects
                .unwrap_or_default()
                .into_iter()
                .map(Detection::from)
                .collect(),
            history_id: self.history_id,
            message: self.message,
        }
    }
}

impl HistoryItem {
    pub fn into_record(self, base_url: &str) -> HistoryRecord {
        HistoryRecord {
            uploaded_at: parse_timestamp(&self.uploaded_at),
            uploaded_at_raw: self.uploaded_at,
            id: self.id,
            filename: self.filename,
            objects_count: self.objects_count,
            labels: self.labels.into_iter().collect(),
            original_image_url: resolve_optional(base_url, self.original_url),
            annotated_image_url: resolve_optional(base_url, self.annotated_url),
        }
    }
}

impl HistoryListResponse {
    /// `items` が無い場合は空リスト
    pub fn into_records(self, base_url: &str) -> Vec<HistoryRecord> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.into_record(base_url))
            .collect()
    }
}

/// RFC 3339 / ISO 8601 のタイムスタンプを読む（タイムゾーン無しはUTC扱い）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// 単一削除の応答を読む
///
/// 応答の形は参考程度。`deleted` → `id` → 要求したIDの順で採用する。
pub fn parse_deleted_record(body: &str, requested_id: &str) -> DeletedRecord {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let id = ["deleted", "id"]
        .iter()
        .find_map(|key| match value.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| requested_id.to_string());
    DeletedRecord { id }
}

/// 全件削除の応答 `{deleted: count}` を読む
///
/// 2xx が返った時点で削除は済んでいるので、本文が読めなくても件数 0 として扱う。
pub fn parse_clear_outcome(body: &str) -> ClearOutcome {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let deleted = value.get("deleted").and_then(Value::as_u64).unwrap_or(0);
    ClearOutcome { deleted }
}
