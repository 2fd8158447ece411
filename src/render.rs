//! 端末向けの表示
//!
//! すべて文字列を返すだけで、出力は呼び出し側が行う。

use crate::session::{InteractionState, Notice, NoticeKind, Phase};
use analyzer_common::{Detection, HistoryRecord};
use chrono::Local;

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::FileSelected => "file selected",
        Phase::Analyzing => "analyzing...",
        Phase::ResultReady => "result ready",
        Phase::Failed => "failed",
    }
}

pub fn notice_line(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Error => format!("✖ {}", notice.text),
        NoticeKind::Info => format!("✔ {}", notice.text),
    }
}

/// 選択中ファイル・パラメータ・状態の要約
pub fn status_panel(state: &InteractionState) -> String {
    let params = state.params();
    let mut lines = vec![format!(
        "Conf: {:.2}  Max dets: {}  Detector: {}  [{}]",
        params.confidence(),
        params.max_detections(),
        params.detector().label(),
        phase_label(state.phase()),
    )];

    match state.preview() {
        Some(preview) => {
            let size = match preview.dimensions() {
                Some((w, h)) => format!("{}x{}, ", w, h),
                None => String::new(),
            };
            lines.push(format!(
                "Selected: {} ({}{} bytes)",
                preview.file_name(),
                size,
                preview.byte_len()
            ));
        }
        None => lines.push("No image selected yet.".to_string()),
    }

    if let Some(result) = state.result() {
        match &result.annotated_image_url {
            Some(url) => lines.push(format!("Annotated output: {}", url)),
            None => lines.push("Annotated output: -".to_string()),
        }
    }
    lines.join("\n")
}

fn format_bbox(bbox: Option<&[f64; 4]>) -> String {
    match bbox {
        Some(b) => b.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "),
        None => "-".to_string(),
    }
}

/// 検出結果の表（サーバーの返した順）
pub fn detections_table(detections: &[Detection]) -> String {
    let mut out = format!("Total: {}\n", detections.len());
    if detections.is_empty() {
        out.push_str("No objects found.");
        return out;
    }

    let label_width = detections
        .iter()
        .map(|d| d.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Label".len());

    out.push_str(&format!(
        "{:<lw$}  {:>5}  {:>10}  BBox [x1, y1, x2, y2]\n",
        "Label",
        "Conf",
        "Area",
        lw = label_width
    ));
    for d in detections {
        out.push_str(&format!(
            "{:<lw$}  {:>5.2}  {:>10}  {}\n",
            d.label,
            d.confidence,
            d.area,
            format_bbox(d.bounding_box.as_ref()),
            lw = label_width
        ));
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn format_uploaded_at(record: &HistoryRecord) -> String {
    match record.uploaded_at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None if record.uploaded_at_raw.is_empty() => "-".to_string(),
        None => record.uploaded_at_raw.clone(),
    }
}

pub fn history_entry(record: &HistoryRecord, busy: bool) -> String {
    let labels = if record.labels.is_empty() {
        String::new()
    } else {
        record
            .labels
            .iter()
            .map(|l| format!("[{}]", l))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let link = record.preferred_image_url().unwrap_or("no image");
    let busy_mark = if busy { "  (Deleting...)" } else { "" };

    format!(
        "{}  id={}{}\n  {} · {} objects  {}\n  {}",
        record.filename,
        record.id,
        busy_mark,
        format_uploaded_at(record),
        record.objects_count,
        labels,
        link
    )
}

/// 最近のアップロード一覧
pub fn history_list(records: &[HistoryRecord], busy_id: Option<&str>) -> String {
    if records.is_empty() {
        return "No records yet.".to_string();
    }
    records
        .iter()
        .map(|r| history_entry(r, busy_id == Some(r.id.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}
