use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// `/analyze` が2xx以外を返した
    #[error("Analyze failed: {status} {body}")]
    Analyze { status: u16, body: String },

    /// 履歴系エンドポイントが2xx以外を返した
    #[error("History request failed ({status}): {body}")]
    History { status: u16, body: String },

    /// 診断用エンドポイントが2xx以外を返した
    #[error("Server request failed ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Common(#[from] analyzer_common::Error),
}

impl AnalyzerError {
    /// 画面に出すメッセージ。空になる場合は `fallback` を使う
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
