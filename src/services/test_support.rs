//! 测试用的可编排抓取器

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{PageFetcher, Query};

type Handler = dyn Fn(&str, &HashMap<String, String>) -> AppResult<String> + Send + Sync;

/// 按闭包返回页面、按 URL 返回图片的抓取器
pub(crate) struct ScriptedFetcher {
    handler: Box<Handler>,
    images: HashMap<String, (Duration, Option<Vec<u8>>)>,
    calls: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(
        handler: impl Fn(&str, &HashMap<String, String>) -> AppResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            images: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 只提供图片的抓取器
    pub(crate) fn images_only() -> Self {
        Self::new(|endpoint, _| Err(AppError::bad_status(endpoint, 404)))
    }

    /// 注册一张图片；`bytes` 为 None 表示下载失败
    pub(crate) fn with_image(mut self, url: &str, delay: Duration, bytes: Option<Vec<u8>>) -> Self {
        self.images.insert(url.to_string(), (delay, bytes));
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    pub(crate) fn calls_to(&self, endpoint: &str) -> Vec<HashMap<String, String>> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(e, _)| e == endpoint)
                    .map(|(_, q)| q.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, endpoint: &str, query: &Query<'_>) -> AppResult<String> {
        let query: HashMap<String, String> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((endpoint.to_string(), query.clone()));
        }
        (self.handler)(endpoint, &query)
    }

    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        match self.images.get(url) {
            Some((delay, bytes)) => {
                tokio::time::sleep(*delay).await;
                bytes.clone().ok_or_else(|| AppError::bad_status(url, 500))
            }
            None => Err(AppError::bad_status(url, 404)),
        }
    }
}
