//! 页面抓取器 - 基础设施层
//!
//! 通过已认证会话发出带参数的 GET 请求，只返回原始响应内容，
//! 不认识课程、作业或题目。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::auth_session::AuthSession;

/// 查询参数
pub type Query<'a> = [(&'a str, String)];

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 请求 `endpoint`，返回响应文本
    async fn fetch(&self, endpoint: &str, query: &Query<'_>) -> AppResult<String>;

    /// 下载二进制内容（图片）
    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>>;
}

/// 请求并解析 JSON 响应
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn PageFetcher,
    endpoint: &str,
    query: &Query<'_>,
) -> AppResult<T> {
    let body = fetcher.fetch(endpoint, query).await?;
    serde_json::from_str(&body).map_err(|e| AppError::json_parse_failed(endpoint, e))
}

/// 基于 reqwest 的页面抓取器
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// 复用会话的客户端（共享 Cookie）
    pub fn new(session: &dyn AuthSession) -> Self {
        Self {
            client: session.http_client(),
        }
    }

    /// 直接使用给定客户端
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder, endpoint: &str) -> AppResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_status(endpoint, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, endpoint: &str, query: &Query<'_>) -> AppResult<String> {
        debug!("GET {} ({} 个参数)", endpoint, query.len());
        let response = self.send(self.client.get(endpoint).query(query), endpoint).await?;
        response
            .text()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))
    }

    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        debug!("下载 {}", url);
        let response = self.send(self.client.get(url), url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;
        Ok(bytes.to_vec())
    }
}
