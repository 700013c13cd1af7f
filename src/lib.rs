//! # Fanya Crawler
//!
//! 学习通（泛雅）课程作业与资料抓取工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有会话与网络资源，只暴露能力
//! - `PassportSession` - 登录并持有带 Cookie 的客户端
//! - `HttpPageFetcher` - 带参数的 GET 请求，返回原始内容
//! - `MarkupIndex` - 可查询的 HTML 树
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `AssignmentPaginator` - 作业列表分页
//! - `question_extractor` - 题目块解析（按题型分派）
//! - `ResourceNavigator` - 资料目录交互式导航
//! - `PdfAssembler` - 并发下载预览图并组装 PDF
//! - `LlmService` - AI 作答能力
//!
//! ### ③ 导出层（Exporters）
//! - `exporters/` - Markdown / Word / JSON 文档
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 登录、选课、分派模式
//! - `orchestrator/homework_processor` - 作业模式
//! - `orchestrator/resource_processor` - 资料模式
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod exporters;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use exporters::ExportFormat;
pub use infrastructure::{HttpPageFetcher, PageFetcher};
pub use models::{Assignment, Course, Question, Resource};
pub use orchestrator::{App, RunMode, RunOptions};
