//! 应用入口 - 编排层
//!
//! 1. **登录**：通过 `PassportSession` 取得带 Cookie 的会话
//! 2. **选课**：列出课程，由操作者输入一个序号
//! 3. **分派**：作业模式交给 `HomeworkProcessor`，资料模式交给 `ResourceProcessor`
//! 4. **统计**：输出最终结果

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, SelectionError};
use crate::exporters::{exporters_for, ExportFormat};
use crate::infrastructure::{AuthSession, HttpPageFetcher, PageFetcher, PassportSession};
use crate::models::Course;
use crate::orchestrator::homework_processor::HomeworkProcessor;
use crate::orchestrator::resource_processor::ResourceProcessor;
use crate::services::{AnswerSolver, CourseService, LlmService, OperatorConsole, Selection};
use crate::utils::logging::{log_section, log_startup, print_final_stats};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunMode {
    /// 抓取作业题目并导出
    Homework,
    /// 浏览课程资料并下载为 PDF
    Resources,
}

impl RunMode {
    pub fn label(self) -> &'static str {
        match self {
            RunMode::Homework => "作业模式",
            RunMode::Resources => "资料模式",
        }
    }
}

/// 单次运行的选项（来自命令行）
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    pub format: ExportFormat,
    pub with_answers: bool,
    pub with_ai: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Homework,
            format: ExportFormat::All,
            with_answers: true,
            with_ai: false,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    options: RunOptions,
    fetcher: Arc<dyn PageFetcher>,
}

impl App {
    /// 初始化应用：检查凭据并登录
    pub async fn initialize(config: Config, options: RunOptions) -> Result<Self> {
        config.require_credentials()?;
        log_startup(
            options.mode.label(),
            config.download_concurrency,
            config.request_delay_ms,
        );

        let session = PassportSession::new(&config)?;
        login(&session, &config).await?;

        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&session));
        Ok(Self::with_fetcher(config, options, fetcher))
    }

    /// 使用已认证的抓取器创建应用
    pub fn with_fetcher(config: Config, options: RunOptions, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            options,
            fetcher,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self, console: &mut dyn OperatorConsole) -> Result<()> {
        log_section("📚 获取课程列表");
        let courses = CourseService::new(self.fetcher.clone(), &self.config)
            .list_courses()
            .await?;

        if courses.is_empty() {
            warn!("⚠️ 没有找到任何课程，程序结束");
            return Ok(());
        }

        let course = select_course(console, &courses)?;
        info!("✓ 已选择课程: {}", course);

        match self.options.mode {
            RunMode::Homework => self.run_homework(&course).await,
            RunMode::Resources => self.run_resources(&course, console).await,
        }
    }

    async fn run_homework(&self, course: &Course) -> Result<()> {
        let solver: Option<Arc<dyn AnswerSolver>> = if self.options.with_ai {
            if self.config.llm_api_key.is_empty() {
                warn!("⚠️ 未配置 LLM_API_KEY，跳过 AI 作答");
                None
            } else {
                Some(Arc::new(LlmService::new(&self.config)))
            }
        } else {
            None
        };

        let exporters = exporters_for(
            self.options.format,
            Path::new(&self.config.output_dir),
            self.options.with_answers,
        );

        let processor = HomeworkProcessor::new(self.fetcher.clone(), &self.config, solver, exporters);
        let stats = processor.process(course).await?;

        for path in &stats.exported {
            info!("📁 {}", path.display());
        }
        print_final_stats(
            stats.fetched,
            stats.failed,
            stats.assignments,
            &self.config.log_file,
        );
        Ok(())
    }

    async fn run_resources(&self, course: &Course, console: &mut dyn OperatorConsole) -> Result<()> {
        let processor = ResourceProcessor::new(self.fetcher.clone(), &self.config);
        let stats = processor.process(course, console).await?;

        print_final_stats(
            stats.assembled,
            stats.failed,
            stats.documents,
            &self.config.log_file,
        );
        Ok(())
    }
}

async fn login(session: &dyn AuthSession, config: &Config) -> AppResult<()> {
    info!("🔐 正在登录...");
    if session.authenticate(&config.phone, &config.password).await? {
        Ok(())
    } else {
        Err(AppError::Auth("平台拒绝了这组手机号和密码".to_string()))
    }
}

/// 由操作者选择一门课程（只接受单个序号）
pub fn select_course(console: &mut dyn OperatorConsole, courses: &[Course]) -> AppResult<Course> {
    let lines: Vec<String> = courses.iter().map(|c| c.display_name.clone()).collect();
    console.show_listing(&lines);
    let prompt = format!("请输入课程编号 (1-{}): ", courses.len());

    loop {
        let Some(line) = console.read_selection(&prompt) else {
            return Err(SelectionError::Aborted.into());
        };

        let picked = Selection::parse(&line).and_then(|selection| {
            selection.check_bounds(courses.len())?;
            match selection {
                Selection::Single(index) => Ok(index),
                _ => Err(SelectionError::Malformed(line.trim().to_string())),
            }
        });

        match picked {
            Ok(index) => return Ok(courses[index - 1].clone()),
            Err(e) => {
                warn!("⚠️ 课程选择无效: {}", e);
                console.report(&e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ScriptedConsole;
    use async_trait::async_trait;

    fn courses() -> Vec<Course> {
        ["数据结构", "操作系统"]
            .iter()
            .enumerate()
            .map(|(i, name)| Course {
                course_id: format!("c{}", i + 1),
                class_id: format!("k{}", i + 1),
                cpi: "p".to_string(),
                display_name: name.to_string(),
                source_url: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_select_course_reprompts_until_single_index() {
        let mut console = ScriptedConsole::new(["1-2", "3", "1-100000000000", "2"]);

        let course = select_course(&mut console, &courses()).unwrap();

        assert_eq!(course.display_name, "操作系统");
        assert_eq!(console.listings[0], vec!["数据结构", "操作系统"]);
        assert_eq!(console.reports.len(), 3);
    }

    #[test]
    fn test_select_course_aborts_on_closed_input() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let result = select_course(&mut console, &courses());
        assert!(matches!(
            result,
            Err(AppError::Selection(SelectionError::Aborted))
        ));
    }

    struct FixedSession(bool);

    #[async_trait]
    impl AuthSession for FixedSession {
        async fn authenticate(&self, _identity: &str, _secret: &str) -> AppResult<bool> {
            Ok(self.0)
        }

        fn http_client(&self) -> reqwest::Client {
            reqwest::Client::new()
        }
    }

    #[tokio::test]
    async fn test_rejected_login_is_auth_error() {
        let config = Config::default();
        assert!(login(&FixedSession(true), &config).await.is_ok());
        assert!(matches!(
            login(&FixedSession(false), &config).await,
            Err(AppError::Auth(_))
        ));
    }
}
