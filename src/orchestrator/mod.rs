//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 登录、获取课程列表、由操作者选择课程
//! - 按运行模式分派给下面两个处理器
//! - 输出全局统计信息
//!
//! ### `homework_processor` - 作业模式
//! - 分页取得全部作业，逐个抓取题目（请求之间有礼貌性间隔）
//! - 全部抓取完成后再调用 AI 作答（可选）
//! - 交给导出器写出文档
//!
//! ### `resource_processor` - 资料模式
//! - 交互式浏览课程资料
//! - 每个选中的文件组装为一份 PDF
//!
//! ## 层次关系
//!
//! ```text
//! app (选择课程)
//!     ↓
//! homework_processor / resource_processor
//!     ↓
//! services (能力层：paginator / extractor / navigator / assembler / llm)
//!     ↓
//! infrastructure (基础设施：AuthSession / PageFetcher / MarkupIndex)
//! ```

pub mod app;
pub mod homework_processor;
pub mod resource_processor;

// 重新导出主要类型
pub use app::{select_course, App, RunMode, RunOptions};
pub use homework_processor::{HomeworkProcessor, HomeworkStats};
pub use resource_processor::{ResourceProcessor, ResourceStats};
