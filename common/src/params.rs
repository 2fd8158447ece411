//! 解析パラメータ
//!
//! 値の範囲はここで保証する。範囲外の入力は境界でクランプし、
//! 数値として読めない入力だけを `Error::Validation` として返す。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CONFIDENCE: f32 = 0.25;
pub const DEFAULT_MAX_DETECTIONS: u32 = 200;
pub const MIN_MAX_DETECTIONS: u32 = 1;
pub const MAX_MAX_DETECTIONS: u32 = 3000;

/// 検出エンジンの指定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorMode {
    #[default]
    Auto,
    Yolo,
    Contour,
}

impl DetectorMode {
    pub const ALL: [DetectorMode; 3] = [DetectorMode::Auto, DetectorMode::Yolo, DetectorMode::Contour];

    /// クエリパラメータとして送る値
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorMode::Auto => "auto",
            DetectorMode::Yolo => "yolo",
            DetectorMode::Contour => "contour",
        }
    }

    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            DetectorMode::Auto => "Auto",
            DetectorMode::Yolo => "YOLO",
            DetectorMode::Contour => "Contour",
        }
    }
}

impl FromStr for DetectorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DetectorMode::Auto),
            "yolo" => Ok(DetectorMode::Yolo),
            "contour" => Ok(DetectorMode::Contour),
            _ => Err(format!("Unknown detector: {}. Use auto, yolo, or contour", s)),
        }
    }
}

impl fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1回の解析リクエストに付けるパラメータ
///
/// フィールドは非公開。セッター経由でのみ変更でき、常に
/// `confidence ∈ [0, 1]`、`max_detections ∈ [1, 3000]` を満たす。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParameters {
    confidence_threshold: f32,
    max_detections: u32,
    detector: DetectorMode,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            max_detections: DEFAULT_MAX_DETECTIONS,
            detector: DetectorMode::Auto,
        }
    }
}

impl AnalysisParameters {
    pub fn new(confidence: f32, max_detections: i64, detector: DetectorMode) -> Self {
        let mut params = Self::default();
        params.set_confidence(confidence);
        params.set_max_detections(max_detections);
        params.set_detector(detector);
        params
    }

    pub fn confidence(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn max_detections(&self) -> u32 {
        self.max_detections
    }

    pub fn detector(&self) -> DetectorMode {
        self.detector
    }

    /// 信頼度を [0, 1] にクランプして設定し、実際に採用された値を返す
    ///
    /// NaN は無視して現在値を維持する。
    pub fn set_confidence(&mut self, value: f32) -> f32 {
        if !value.is_nan() {
            self.confidence_threshold = value.clamp(0.0, 1.0);
        }
        self.confidence_threshold
    }

    /// 最大検出数を [1, 3000] にクランプして設定する
    pub fn set_max_detections(&mut self, value: i64) -> u32 {
        let clamped = value.clamp(MIN_MAX_DETECTIONS as i64, MAX_MAX_DETECTIONS as i64);
        self.max_detections = clamped as u32;
        self.max_detections
    }

    pub fn set_detector(&mut self, detector: DetectorMode) {
        self.detector = detector;
    }

    /// `/analyze` のクエリ文字列ペア
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("conf", self.confidence_threshold.to_string()),
            ("max_dets", self.max_detections.to_string()),
            ("detector", self.detector.as_str().to_string()),
        ]
    }
}

/// テキスト入力から信頼度を読む（範囲外はクランプ）
pub fn parse_confidence(input: &str) -> Result<f32> {
    let value: f32 = input
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("confidence must be a number: {}", input.trim())))?;
    if value.is_nan() {
        return Err(Error::Validation("confidence must be a number: NaN".into()));
    }
    Ok(value.clamp(0.0, 1.0))
}

/// テキスト入力から最大検出数を読む（空欄は1、範囲外はクランプ）
pub fn parse_max_detections(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(MIN_MAX_DETECTIONS);
    }
    let value: i64 = trimmed
        .parse()
        .map_err(|_| Error::Validation(format!("max detections must be an integer: {}", trimmed)))?;
    Ok(value.clamp(MIN_MAX_DETECTIONS as i64, MAX_MAX_DETECTIONS as i64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = AnalysisParameters::default();
        assert_eq!(params.confidence(), 0.25);
        assert_eq!(params.max_detections(), 200);
        assert_eq!(params.detector(), DetectorMode::Auto);
    }

    #[test]
    fn test_confidence_clamped() {
        let mut params = AnalysisParameters::default();
        assert_eq!(params.set_confidence(1.5), 1.0);
        assert_eq!(params.set_confidence(-0.2), 0.0);
        assert_eq!(params.set_confidence(0.6), 0.6);
        assert_eq!(params.set_confidence(f32::NAN), 0.6);
    }

    #[test]
    fn test_max_detections_clamped() {
        let mut params = AnalysisParameters::default();
        assert_eq!(params.set_max_detections(0), 1);
        assert_eq!(params.set_max_detections(-5), 1);
        assert_eq!(params.set_max_detections(5000), 3000);
        assert_eq!(params.set_max_detections(42), 42);
    }

    #[test]
    fn test_new_clamps_every_field() {
        let params = AnalysisParameters::new(1.5, 0, DetectorMode::Yolo);
        assert_eq!(params.confidence(), 1.0);
        assert_eq!(params.max_detections(), 1);
        assert_eq!(params.detector(), DetectorMode::Yolo);
    }

    #[test]
    fn test_query_pairs() {
        let params = AnalysisParameters::new(0.5, 10, DetectorMode::Contour);
        let pairs = params.query_pairs();
        assert_eq!(pairs[0], ("conf", "0.5".to_string()));
        assert_eq!(pairs[1], ("max_dets", "10".to_string()));
        assert_eq!(pairs[2], ("detector", "contour".to_string()));
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence("1.5").unwrap(), 1.0);
        assert_eq!(parse_confidence(" 0.3 ").unwrap(), 0.3);
        assert!(matches!(parse_confidence("abc"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_max_detections() {
        assert_eq!(parse_max_detections("0").unwrap(), 1);
        assert_eq!(parse_max_detections("").unwrap(), 1);
        assert_eq!(parse_max_detections("9999").unwrap(), 3000);
        assert!(matches!(parse_max_detections("1.5"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_detector_from_str() {
        assert_eq!("YOLO".parse::<DetectorMode>().unwrap(), DetectorMode::Yolo);
        assert_eq!("contour".parse::<DetectorMode>().unwrap(), DetectorMode::Contour);
        assert!("ssd".parse::<DetectorMode>().is_err());
    }
}
