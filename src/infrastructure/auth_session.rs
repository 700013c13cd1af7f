//! 登录会话 - 基础设施层
//!
//! 持有带 Cookie 的 HTTP 客户端，只暴露"登录"和"取得已认证客户端"两种能力。

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::cipher::CredentialCipher;

/// 已认证会话
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// 登录，返回平台是否接受这组凭据
    async fn authenticate(&self, identity: &str, secret: &str) -> AppResult<bool>;

    /// 共享 Cookie 的 HTTP 客户端
    fn http_client(&self) -> reqwest::Client;
}

/// 登录接口响应
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    status: bool,
    msg: Option<String>,
    msg2: Option<String>,
}

/// 通行证登录会话
pub struct PassportSession {
    client: reqwest::Client,
    login_url: String,
    cipher: CredentialCipher,
}

impl PassportSession {
    /// 创建会话（尚未登录）
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::request_failed("client", e))?;

        Ok(Self {
            client,
            login_url: config.login_url.clone(),
            cipher: CredentialCipher::default(),
        })
    }
}

#[async_trait]
impl AuthSession for PassportSession {
    async fn authenticate(&self, identity: &str, secret: &str) -> AppResult<bool> {
        debug!("正在登录: {}", self.login_url);

        let form = [
            ("uname", self.cipher.encrypt(identity)),
            ("password", self.cipher.encrypt(secret)),
            ("t", "true".to_string()),
            ("validate", String::new()),
            ("doubleFactorLogin", "0".to_string()),
            ("independentId", "0".to_string()),
        ];

        let response = self
            .client
            .post(&self.login_url)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", "https://passport2.chaoxing.com/login")
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::request_failed(&self.login_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_status(&self.login_url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::request_failed(&self.login_url, e))?;
        let result: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::json_parse_failed(&self.login_url, e))?;

        if result.status {
            info!("✓ 登录成功");
        } else {
            let reason = result
                .msg2
                .or(result.msg)
                .unwrap_or_else(|| "未知错误".to_string());
            warn!("⚠️ 登录被拒绝: {}", reason);
        }
        Ok(result.status)
    }

    fn http_client(&self) -> reqwest::Client {
        self.client.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_tolerates_missing_fields() {
        let ok: LoginResponse = serde_json::from_str(r#"{"status":true,"url":"x"}"#).unwrap();
        assert!(ok.status);

        let rejected: LoginResponse =
            serde_json::from_str(r#"{"status":false,"msg2":"用户名或密码错误"}"#).unwrap();
        assert!(!rejected.status);
        assert_eq!(rejected.msg2.as_deref(), Some("用户名或密码错误"));

        let empty: LoginResponse = serde_json::from_str("{}").unwrap();
        assert!(!empty.status);
    }
}
