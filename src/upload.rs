//! 解析に送る画像ファイル

use crate::error::Result;
use image::ImageFormat;
use std::path::Path;
use std::sync::Arc;

const FALLBACK_MIME: &str = "application/octet-stream";

/// ユーザーが選択した画像（バイナリ + 表示名）
///
/// 中身は `Arc` で共有するので、送信用に複製しても読み直しは発生しない。
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// ファイル名の拡張子からMIMEタイプを推定
    pub fn mime_type(&self) -> &'static str {
        ImageFormat::from_path(&self.name)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME)
    }
}
