//! 解析バックエンドとのHTTP通信
//!
//! 各関数は1往復のみでリトライしない。状態は持たず、結果を返すか失敗するだけ。

use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::upload::SelectedFile;
use analyzer_common::wire::{
    parse_clear_outcome, parse_deleted_record, AnalyzeResponse, HistoryItem, HistoryListResponse,
};
use analyzer_common::{
    AnalysisParameters, AnalysisResult, ClearOutcome, DeletedRecord, HistoryRecord, ServerConfig,
    ServerVersion,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// セッションから見た解析サービス
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, file: &SelectedFile, params: &AnalysisParameters) -> Result<AnalysisResult>;
    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>>;
    async fn delete_history_record(&self, id: &str) -> Result<DeletedRecord>;
    async fn clear_history(&self) -> Result<ClearOutcome>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// `/history/{id}`（IDはパスセグメントとしてエスケープする）
    fn record_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("/history"))
            .map_err(|e| AnalyzerError::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AnalyzerError::Config(format!("invalid base URL {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    pub async fn analyze(&self, file: &SelectedFile, params: &AnalysisParameters) -> Result<AnalysisResult> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let form = Form::new().part("file", part);

        let url = self.endpoint("/analyze");
        debug!(%url, file = file.name(), bytes = file.len(), "POST analyze");
        let resp = self
            .http
            .post(&url)
            .query(&params.query_pairs())
            .multipart(form)
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            return Err(AnalyzerError::Analyze {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_result(&self.base_url))
    }

    pub async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let url = self.endpoint("/history");
        debug!(%url, limit, "GET history");
        let resp = self
            .http
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let body = expect_success(resp, history_error).await?;
        let parsed: HistoryListResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_records(&self.base_url))
    }

    pub async fn get_history_record(&self, id: &str) -> Result<HistoryRecord> {
        let url = self.record_url(id)?;
        debug!(%url, "GET history record");
        let resp = self.http.get(url).send().await?;

        let body = expect_success(resp, history_error).await?;
        let item: HistoryItem = serde_json::from_str(&body)?;
        Ok(item.into_record(&self.base_url))
    }

    pub async fn delete_history_record(&self, id: &str) -> Result<DeletedRecord> {
        let url = self.record_url(id)?;
        debug!(%url, "DELETE history record");
        let resp = self.http.delete(url).send().await?;

        let body = expect_success(resp, history_error).await?;
        Ok(parse_deleted_record(&body, id))
    }

    pub async fn clear_history(&self) -> Result<ClearOutcome> {
        let url = self.endpoint("/history");
        debug!(%url, "DELETE history");
        let resp = self.http.delete(&url).send().await?;

        let body = expect_success(resp, history_error).await?;
        Ok(parse_clear_outcome(&body))
    }

    pub async fn server_version(&self) -> Result<ServerVersion> {
        self.get_json("/debug/version").await
    }

    pub async fn server_config(&self) -> Result<ServerConfig> {
        self.get_json("/debug/config").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let resp = self.http.get(&url).send().await?;
        let body = expect_success(resp, server_error).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalysisBackend for ApiClient {
    async fn analyze(&self, file: &SelectedFile, params: &AnalysisParameters) -> Result<AnalysisResult> {
        ApiClient::analyze(self, file, params).await
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        ApiClient::list_history(self, limit).await
    }

    async fn delete_history_record(&self, id: &str) -> Result<DeletedRecord> {
        ApiClient::delete_history_record(self, id).await
    }

    async fn clear_history(&self) -> Result<ClearOutcome> {
        ApiClient::clear_history(self).await
    }
}

async fn read_body(resp: Response) -> Result<(StatusCode, String)> {
    let status = resp.status();
    let body = resp.text().await?;
    debug!(status = status.as_u16(), len = body.len(), "response received");
    Ok((status, body))
}

/// 2xx なら本文、それ以外は `to_error` で変換したエラー
async fn expect_success(resp: Response, to_error: fn(u16, String) -> AnalyzerError) -> Result<String> {
    let (status, body) = read_body(resp).await?;
    if !status.is_success() {
        return Err(to_error(status.as_u16(), body));
    }
    Ok(body)
}

fn history_error(status: u16, body: String) -> AnalyzerError {
    AnalyzerError::History { status, body }
}

fn server_error(status: u16, body: String) -> AnalyzerError {
    AnalyzerError::Server { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let c = client("http://localhost:8000/");
        assert_eq!(c.base_url(), "http://localhost:8000");
        assert_eq!(c.endpoint("/analyze"), "http://localhost:8000/api/v1/analyze");
    }

    #[test]
    fn test_record_url_escapes_id() {
        let c = client("http://localhost:8000");
        assert_eq!(
            c.record_url("42").unwrap().as_str(),
            "http://localhost:8000/api/v1/history/42"
        );
        assert_eq!(
            c.record_url("a/b c").unwrap().as_str(),
            "http://localhost:8000/api/v1/history/a%2Fb%20c"
        );
    }
}
