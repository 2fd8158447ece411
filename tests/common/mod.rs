//! 統合テスト用の共通ヘルパー
#![allow(dead_code)]

use analyzer_common::wire::{AnalyzeResponse, HistoryListResponse};
use analyzer_common::{AnalysisParameters, AnalysisResult, ClearOutcome, DeletedRecord, HistoryRecord};
use async_trait::async_trait;
use image_analyzer::client::AnalysisBackend;
use image_analyzer::error::{AnalyzerError, Result};
use image_analyzer::upload::SelectedFile;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const BASE: &str = "http://localhost:8000";

/// 応答を順番に返す偽バックエンド
#[derive(Default)]
pub struct FakeBackend {
    analyze: Mutex<VecDeque<Result<AnalysisResult>>>,
    history: Mutex<VecDeque<Result<Vec<HistoryRecord>>>>,
    delete: Mutex<VecDeque<Result<DeletedRecord>>>,
    clear: Mutex<VecDeque<Result<ClearOutcome>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn with_analyze(self, outcome: Result<AnalysisResult>) -> Self {
        self.analyze.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_history(self, outcome: Result<Vec<HistoryRecord>>) -> Self {
        self.history.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_delete(self, outcome: Result<DeletedRecord>) -> Self {
        self.delete.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_clear(self, outcome: Result<ClearOutcome>) -> Self {
        self.clear.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unscripted() -> AnalyzerError {
    AnalyzerError::History {
        status: 599,
        body: "unscripted call".into(),
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T>>>) -> Result<T> {
    queue.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn analyze(&self, file: &SelectedFile, params: &AnalysisParameters) -> Result<AnalysisResult> {
        self.record(format!("analyze {} conf={}", file.name(), params.confidence()));
        next(&self.analyze)
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        self.record(format!("list_history {}", limit));
        next(&self.history)
    }

    async fn delete_history_record(&self, id: &str) -> Result<DeletedRecord> {
        self.record(format!("delete {}", id));
        next(&self.delete)
    }

    async fn clear_history(&self) -> Result<ClearOutcome> {
        self.record("clear".to_string());
        next(&self.clear)
    }
}

/// サーバー応答JSONから解析結果を作る
pub fn analysis_from_json(json: &str) -> AnalysisResult {
    serde_json::from_str::<AnalyzeResponse>(json)
        .expect("invalid analyze json")
        .into_result(BASE)
}

pub fn records(ids: &[&str]) -> Vec<HistoryRecord> {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "filename": format!("{}.jpg", id),
                "uploaded_at": "2025-01-02T03:04:05Z",
                "objects_count": 1,
                "labels": ["person"],
                "annotated_url": format!("/static/annotated/{}.jpg", id),
            })
        })
        .collect();
    serde_json::from_value::<HistoryListResponse>(serde_json::json!({ "items": items }))
        .expect("invalid history json")
        .into_records(BASE)
}

pub fn ids(records: &[HistoryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

pub fn server_error(body: &str) -> AnalyzerError {
    AnalyzerError::History {
        status: 500,
        body: body.to_string(),
    }
}

pub fn image_file(name: &str) -> SelectedFile {
    SelectedFile::new(name, b"fake image bytes".to_vec())
}

/// 1リクエストだけ受けて決まった応答を返すHTTPサーバー
///
/// 戻り値の JoinHandle は受信したリクエスト全文を返す。
pub async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            return String::from_utf8_lossy(&buf).to_string();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &buf[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => find(body, b"0\r\n\r\n").is_some(),
            None => true,
        };
        if done {
            break;
        }
        let n = socket.read(&mut chunk).await.expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
