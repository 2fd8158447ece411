//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use analyzer_common::{parse_confidence, parse_max_detections};
use image_analyzer::config::Config;
use image_analyzer::error::AnalyzerError;
use image_analyzer::upload::SelectedFile;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないファイルを選択した場合
#[test]
fn test_select_nonexistent_file() {
    let result = SelectedFile::from_path(Path::new("/nonexistent/path/12345.jpg"));
    assert!(matches!(result, Err(AnalyzerError::Io(_))));
}

/// 壊れた設定ファイル
#[test]
fn test_load_broken_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(AnalyzerError::JsonParse(_))));
}

/// http(s) 以外のベースURLは拒否
#[test]
fn test_invalid_base_url() {
    let mut config = Config::default();
    let err = config.set_base_url("ftp://example.com".to_string()).unwrap_err();
    assert!(matches!(err, AnalyzerError::Config(_)));
}

/// 数値でない入力は検証エラー
#[test]
fn test_invalid_numeric_input() {
    let err: AnalyzerError = parse_confidence("abc").unwrap_err().into();
    assert!(err.to_string().starts_with("Invalid input:"));

    let err: AnalyzerError = parse_max_detections("1.5").unwrap_err().into();
    assert!(matches!(err, AnalyzerError::Common(_)));
}

/// AnalyzerErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        AnalyzerError::Analyze { status: 500, body: "boom".into() },
        AnalyzerError::History { status: 404, body: "missing".into() },
        AnalyzerError::Server { status: 503, body: "down".into() },
        AnalyzerError::Config("bad url".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "Error display should not be empty");
    }

    assert_eq!(
        AnalyzerError::Analyze { status: 500, body: "boom".into() }.to_string(),
        "Analyze failed: 500 boom"
    );
    assert_eq!(
        AnalyzerError::History { status: 404, body: "missing".into() }.to_string(),
        "History request failed (404): missing"
    );
}

/// 表示メッセージは本文を含む
#[test]
fn test_user_message() {
    let err = AnalyzerError::Analyze { status: 502, body: String::new() };
    assert_eq!(err.user_message("Analyze failed"), "Analyze failed: 502 ");

    let err = AnalyzerError::Config(String::new());
    assert_eq!(err.user_message("fallback"), "Config error: ");
}
