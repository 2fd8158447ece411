//! ローカル表示用のプレビューハンドル
//!
//! ハンドルは `PreviewRegistry` が発行し、`revoke` に渡すと消費される。
//! 生きているハンドルは常にレジストリの `live` に載っているので、
//! リークはテストで `live_count()` を見れば分かる。

use crate::upload::SelectedFile;
use std::collections::BTreeSet;
use std::io::Cursor;

/// プレビュー1件分の情報
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
    uri: String,
    file_name: String,
    byte_len: usize,
    dimensions: Option<(u32, u32)>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// デコードできた場合のみ `(width, height)`
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    live: BTreeSet<u64>,
}

impl PreviewRegistry {
    pub fn create(&mut self, file: &SelectedFile) -> PreviewHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id);
        PreviewHandle {
            id,
            uri: format!("preview://{}/{}", id, file.name()),
            file_name: file.name().to_string(),
            byte_len: file.len(),
            dimensions: read_dimensions(file.bytes()),
        }
    }

    /// ハンドルを解放する。既に解放済みなら false
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        self.live.remove(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
