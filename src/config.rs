use crate::error::{AnalyzerError, Result};
use analyzer_common::{AnalysisParameters, DetectorMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
/// バックエンドが受け付ける履歴件数の上限
pub const MAX_HISTORY_LIMIT: usize = 200;
pub const BASE_URL_ENV: &str = "IMAGE_ANALYZER_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub history_limit: usize,
    pub timeout_seconds: u64,
    pub default_confidence: f32,
    pub default_max_detections: u32,
    pub default_detector: DetectorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            timeout_seconds: 60,
            default_confidence: 0.25,
            default_max_detections: 200,
            default_detector: DetectorMode::Auto,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        // 環境変数を優先
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AnalyzerError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("image-analyzer").join("config.json"))
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AnalyzerError::Config(format!(
                "base URL must start with http:// or https://: {}",
                url
            )));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    /// 保存値から解析パラメータの初期値を作る（範囲外はクランプ）
    pub fn default_parameters(&self) -> AnalysisParameters {
        AnalysisParameters::new(
            self.default_confidence,
            self.default_max_detections as i64,
            self.default_detector,
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}
