//! 错误类型
//!
//! 只有"必须中断当前操作"的情况才会成为错误值。
//! 结构缺失（某个元素找不到）和分类缺失（未知题型 / 不支持的资源类型）
//! 都在最小粒度上就地恢复并记录 warn 日志，不会出现在这里。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 网络 / HTTP 错误
    #[error("网络错误: {0}")]
    Transport(#[from] TransportError),
    /// 登录失败
    #[error("登录失败: {0}")]
    Auth(String),
    /// 操作者输入的选择无效
    #[error("选择错误: {0}")]
    Selection(#[from] SelectionError),
    /// 资源阅读 / 预览接口返回失败
    #[error("资源错误: {0}")]
    Resource(#[from] ResourceError),
    /// PDF 组装错误
    #[error("组装错误: {0}")]
    Assembly(#[from] AssemblyError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 网络 / HTTP 错误，对当前操作总是致命的，不做重试
#[derive(Debug, Error)]
pub enum TransportError {
    /// 请求发送失败（连接、超时、读取响应体）
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 2xx 状态码
    #[error("状态码异常 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// JSON 响应解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 选择表达式错误，报告给操作者后重新提示
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// 空输入
    #[error("输入为空")]
    Empty,
    /// 无法解析的表达式
    #[error("无法解析的选择: '{0}'")]
    Malformed(String),
    /// 同时出现 '-' 和 ','
    #[error("不支持同时使用 '-' 和 ',': '{0}'")]
    MixedForms(String),
    /// 范围起点大于终点
    #[error("无效范围: {start}-{end}")]
    InvalidRange { start: usize, end: usize },
    /// 序号超出列表范围
    #[error("序号 {index} 超出范围 [1, {max}]")]
    IndexOutOfRange { index: usize, max: usize },
    /// 多选中包含文件夹
    #[error("文件夹不能多选: 第 {index} 项 '{name}'")]
    FolderInMultiSelect { index: usize, name: String },
    /// 所选条目中没有受支持的文件
    #[error("所选条目中没有可预览的文件")]
    NoSupportedFile,
    /// 输入源已关闭
    #[error("操作者取消了选择")]
    Aborted,
}

/// 资源阅读 / 预览接口错误
#[derive(Debug, Error)]
pub enum ResourceError {
    /// 阅读计数接口返回失败
    #[error("阅读计数失败 ({name}): {message}")]
    ReadCountRejected { name: String, message: String },
    /// 预览接口返回失败
    #[error("获取预览失败 ({name}): {message}")]
    PreviewRejected { name: String, message: String },
}

/// PDF 组装错误
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 没有任何页面下载成功
    #[error("没有任何页面下载成功: {name}")]
    NoPages { name: String },
    /// 图片解码失败
    #[error("第 {page} 页图片解码失败: {message}")]
    ImageDecode { page: u32, message: String },
    /// PDF 写入失败
    #[error("PDF写入失败 ({path}): {message}")]
    PdfWrite { path: String, message: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 构建请求失败
    #[error("构建请求失败: {0}")]
    RequestBuild(String),
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 序列化失败
    #[error("序列化失败 ({path}): {source}")]
    SerializeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 解析失败
    #[error("配置文件 {path} 解析失败: {message}")]
    TomlParseFailed { path: String, message: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少必填项
    #[error("缺少配置项: {0}")]
    Missing(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Transport(TransportError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建状态码异常错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        AppError::Transport(TransportError::BadStatus {
            endpoint: endpoint.into(),
            status,
        })
    }

    /// 创建 JSON 解析错误
    pub fn json_parse_failed(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Transport(TransportError::JsonParseFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为网络错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
