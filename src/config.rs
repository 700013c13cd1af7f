use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量 → 命令行参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 登录手机号
    pub phone: String,
    /// 登录密码
    pub password: String,
    /// 浏览器 User-Agent
    pub user_agent: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 相邻两次作业抓取 / AI 调用之间的间隔（毫秒），0 表示不等待
    pub request_delay_ms: u64,
    /// 图片下载并发数
    pub download_concurrency: usize,
    /// 输出目录
    pub output_dir: String,
    /// 日志文件
    pub log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 接口地址 ---
    pub login_url: String,
    pub course_list_url: String,
    pub course_middle_url: String,
    pub work_list_url: String,
    pub work_view_url: String,
    pub resource_list_url: String,
    pub resource_read_count_url: String,
    pub resource_preview_url: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phone: String::new(),
            password: String::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0"
                .to_string(),
            request_timeout_secs: 30,
            request_delay_ms: 1000,
            download_concurrency: 4,
            output_dir: "output".to_string(),
            log_file: "fanya_crawler.log".to_string(),
            verbose_logging: false,
            login_url: "https://passport2.chaoxing.com/fanyalogin".to_string(),
            course_list_url: "https://mooc2-ans.chaoxing.com/mooc2-ans/visit/courselistdata"
                .to_string(),
            course_middle_url: "https://mooc1.chaoxing.com/visit/stucoursemiddle".to_string(),
            work_list_url: "https://mooc1.chaoxing.com/mooc2/work/list".to_string(),
            work_view_url: "https://mooc1.chaoxing.com/mooc-ans/mooc2/work/view".to_string(),
            resource_list_url: "https://mooc1.chaoxing.com/mooc-ans/coursedata/stu-datalist"
                .to_string(),
            resource_read_count_url:
                "https://mooc1.chaoxing.com/mooc-ans/coursedata/add-read-count".to_string(),
            resource_preview_url: "https://mooc1.chaoxing.com/mooc-ans/coursedata/preview"
                .to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 读取配置文件（不存在时使用默认值），再应用环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) if p.exists() => Self::from_toml_file(p)?,
            _ => Self::default(),
        };
        base.with_env()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::read_failed(path.display().to_string(), e)
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| {
            ConfigError::TomlParseFailed {
                path: origin.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> AppResult<Self> {
        Ok(Self {
            phone: env_string("FANYA_PHONE").unwrap_or(self.phone),
            password: env_string("FANYA_PASSWORD").unwrap_or(self.password),
            user_agent: env_string("FANYA_USER_AGENT").unwrap_or(self.user_agent),
            request_timeout_secs: env_parsed("FANYA_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            request_delay_ms: env_parsed("FANYA_REQUEST_DELAY_MS", "u64")?
                .unwrap_or(self.request_delay_ms),
            download_concurrency: env_parsed("FANYA_DOWNLOAD_CONCURRENCY", "usize")?
                .unwrap_or(self.download_concurrency),
            output_dir: env_string("FANYA_OUTPUT_DIR").unwrap_or(self.output_dir),
            log_file: env_string("FANYA_LOG_FILE").unwrap_or(self.log_file),
            verbose_logging: env_parsed("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            ..self
        })
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 礼貌性请求间隔
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 检查登录凭据是否齐全
    pub fn require_credentials(&self) -> AppResult<()> {
        if self.phone.is_empty() {
            return Err(ConfigError::Missing("phone (FANYA_PHONE / --phone)".to_string()).into());
        }
        if self.password.is_empty() {
            return Err(
                ConfigError::Missing("password (FANYA_PASSWORD / --password)".to_string()).into(),
            );
        }
        Ok(())
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
    }
}
