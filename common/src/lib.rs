//! Image Analyzer Common Library
//!
//! 解析クライアントで共有されるドメイン型とバックエンドのJSON形式

pub mod error;
pub mod params;
pub mod types;
pub mod wire;

pub use error::{Error, Result};
pub use params::{parse_confidence, parse_max_detections, AnalysisParameters, DetectorMode};
pub use types::{AnalysisResult, ClearOutcome, DeletedRecord, Detection, HistoryRecord};
pub use wire::{resolve_url, ServerConfig, ServerVersion};
